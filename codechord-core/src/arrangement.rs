//! Static note list for a whole progression
//!
//! Walks the progression through the same style expander playback uses and
//! flattens every event into single MIDI notes positioned in beats.

use crate::types::progression::Progression;
use crate::types::style::expand;
use crate::types::time::{beats, Time};

/// One note of the arrangement, timed in beats from the start
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangedNote {
    pub key: u8,
    pub start: Time,
    pub duration: Time,
    pub velocity: f32,
}

impl ArrangedNote {
    pub fn end(&self) -> Time {
        self.start + self.duration
    }

    /// Velocity scaled to the MIDI range
    pub fn midi_velocity(&self) -> u8 {
        (self.velocity.clamp(0.0, 1.0) * 127.0).round() as u8
    }
}

/// Flatten a progression into notes. Pitches without a MIDI key are skipped.
pub fn arrange(progression: &Progression) -> Vec<ArrangedNote> {
    let mut notes = Vec::new();

    for (slot, entry) in progression.iter().enumerate() {
        let slot_start = beats(slot as i64);
        for event in expand(entry.style, &entry.pitches()) {
            for pitch in event.pitches.iter() {
                match pitch.midi() {
                    Some(key) => notes.push(ArrangedNote {
                        key,
                        start: slot_start + event.beat_offset,
                        duration: event.duration_beats,
                        velocity: event.velocity,
                    }),
                    None => log::debug!("Dropping {} in slot {}: no MIDI key", pitch, slot),
                }
            }
        }
    }

    notes
}

/// Length of a progression in beats
pub fn total_beats(progression: &Progression) -> Time {
    beats(progression.len() as i64)
}
