//! # codechord
//!
//! Sketch chord progressions as text, hear them through a built-in synth or
//! a MIDI port, and export them as Standard MIDI Files.
//!
//! Parsing, chord spelling and style expansion live in `codechord-core`.
//! This crate adds the real-time side:
//!
//! - `audio`: the synth, the MIDI output, output routing and the beat
//!   transport.
//! - `playback`: turns a progression into transport events and previews
//!   single chords.
//! - `export`: Standard MIDI File rendering.
//! - `commands` and `repl`: the interactive front end.

pub mod audio;
pub mod commands;
pub mod export;
pub mod playback;
pub mod repl;

pub use crate::export::{export_midi, export_midi_with_tempo, write_midi_file};
pub use crate::playback::{playback_events, Player};
pub use codechord_core::{parse, serialize, Progression, ProgressionEditor, StyleTag};
