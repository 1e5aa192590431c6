// codechord-core/src/types/mod.rs

pub mod chord_symbol;
pub mod note;
pub mod progression;
pub mod scheduled_event;
pub mod settings;
pub mod style;
pub mod time;

pub use chord_symbol::{lookup_chord, resolve_chord_tones, PitchSet};
pub use note::{Interval, Note, PitchName};
pub use progression::{ChordEntry, Progression};
pub use scheduled_event::{ScheduledAction, ScheduledEvent};
pub use settings::{AdsrParams, PlaybackSettings, Waveform};
pub use style::{expand, expand_preview, NoteClass, NoteEvent, StyleTag, DEFAULT_VELOCITY};
pub use time::Time;
