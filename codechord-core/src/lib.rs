//! # Codechord Core
//!
//! Device-free core of the Codechord progression sketcher: chord symbol
//! resolution, rhythmic style expansion, progression text editing and the
//! beat-unit note list shared by playback and MIDI export.
//!
//! ## Features
//!
//! - **serde**: Serialize progressions and settings
//!
//! ## Example
//!
//! ```
//! use codechord_core::editor::parse;
//! use codechord_core::arrangement::arrange;
//! use codechord_core::types::Progression;
//!
//! let progression = parse("Cmaj7(block)-F7", &Progression::new());
//! let notes = arrange(&progression);
//! assert_eq!(notes.len(), 4 + 2 * 4);
//! ```

pub mod arrangement;
pub mod editor;
pub mod types;

pub use arrangement::{arrange, ArrangedNote};
pub use editor::{parse, serialize, EditSource, ProgressionEditor};
pub use types::{ChordEntry, PitchName, PitchSet, PlaybackSettings, Progression, StyleTag};
