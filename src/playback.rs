//! Real-time playback of a progression
//!
//! Every chord is expanded through the shared style expander and queued on
//! the transport at `slot + offset` beats; a final stop is queued at the end
//! of the last slot.

use crate::audio::sink::TriggerSink;
use crate::audio::transport::Transport;
use anyhow::Result;
use codechord_core::arrangement::total_beats;
use codechord_core::types::style::{expand, expand_preview};
use codechord_core::types::time::{beats, beats_to_seconds, Time};
use codechord_core::types::{resolve_chord_tones, Progression, ScheduledAction, StyleTag};
use std::sync::Arc;
use std::time::Duration;

/// Transport actions for a whole progression, in slot order
pub fn playback_events(progression: &Progression) -> Vec<(Time, ScheduledAction)> {
    let mut events = Vec::new();
    for (slot, entry) in progression.iter().enumerate() {
        let slot_start = beats(slot as i64);
        for event in expand(entry.style, &entry.pitches()) {
            events.push((
                slot_start + event.beat_offset,
                ScheduledAction::Trigger {
                    pitches: event.pitches,
                    duration_beats: event.duration_beats,
                },
            ));
        }
    }
    events.push((total_beats(progression), ScheduledAction::Stop));
    events
}

/// Drives the transport and previews single chords
pub struct Player {
    transport: Transport,
    sink: Arc<dyn TriggerSink>,
}

impl Player {
    pub fn new(sink: Arc<dyn TriggerSink>, bpm: u32) -> Self {
        Self {
            transport: Transport::new(bpm as f64, sink.clone()),
            sink,
        }
    }

    /// Play a progression from the top, replacing anything already playing
    pub fn schedule_playback(&self, progression: &Progression, bpm: u32, volume_db: f32) -> Result<()> {
        self.stop()?;

        self.transport.set_bpm(bpm as f64);
        self.sink.set_volume_db(volume_db);
        self.transport.schedule(playback_events(progression))?;
        self.transport.start()?;

        log::info!(
            "Playing {} chords at {} BPM",
            progression.len(),
            bpm
        );
        Ok(())
    }

    /// Cancel every pending trigger and halt the transport
    pub fn stop(&self) -> Result<()> {
        self.transport.cancel()?;
        self.transport.stop()
    }

    /// Stop playback and release anything still ringing
    pub fn stop_and_silence(&self) -> Result<()> {
        self.stop()?;
        self.sink.silence();
        Ok(())
    }

    /// Audition one chord with the simplified preview pattern. Stops
    /// playback first; an empty symbol does nothing.
    pub fn preview_chord(&self, symbol: &str, style: StyleTag, bpm: u32) -> Result<()> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Ok(());
        }
        self.stop()?;

        let bpm = bpm as f64;
        for event in expand_preview(style, &resolve_chord_tones(symbol)) {
            self.sink.trigger(
                event.pitches.as_slice(),
                Duration::from_secs_f64(beats_to_seconds(event.duration_beats, bpm)),
                Duration::from_secs_f64(beats_to_seconds(event.beat_offset, bpm)),
            );
        }
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_running()
    }

    pub fn set_volume_db(&self, db: f32) {
        self.sink.set_volume_db(db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codechord_core::editor::parse;
    use codechord_core::types::time::time;
    use codechord_core::types::ScheduledEvent;
    use std::collections::BinaryHeap;

    /// Triggers popped off a transport-style heap before the stop
    fn triggers_before_stop(text: &str) -> usize {
        let mut heap: BinaryHeap<ScheduledEvent> = playback_events(&parse(text, &Progression::new()))
            .into_iter()
            .map(|(beat, action)| ScheduledEvent::new(beat, action, 0))
            .collect();
        let mut count = 0;
        while let Some(event) = heap.pop() {
            match event.action {
                ScheduledAction::Trigger { .. } => count += 1,
                ScheduledAction::Stop => break,
            }
        }
        count
    }

    #[test]
    fn test_last_arpeggio_note_beats_the_stop() {
        // Fifth note of a five-note arpeggio lands on the final beat
        assert_eq!(triggers_before_stop("C9(arpeggio)"), 5);
        assert_eq!(triggers_before_stop("C-C9(arpeggio)"), 7);
        assert_eq!(triggers_before_stop("C-D-C9(arpeggio)"), 9);
    }

    #[test]
    fn test_events_offset_by_slot() {
        let prog = parse("C(comping)-G(block)", &Progression::new());
        let events = playback_events(&prog);
        let beats_at: Vec<Time> = events.iter().map(|(b, _)| *b).collect();
        assert_eq!(beats_at, vec![beats(0), time(1, 4), beats(1), beats(2)]);
        assert!(matches!(events.last(), Some((_, ScheduledAction::Stop))));
    }

    #[test]
    fn test_empty_progression_only_stops() {
        let events = playback_events(&Progression::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, beats(0));
    }

    #[test]
    fn test_trigger_durations_match_style() {
        let prog = parse("Cm7(stabs)", &Progression::new());
        for (_, action) in playback_events(&prog) {
            if let ScheduledAction::Trigger {
                pitches,
                duration_beats,
            } = action
            {
                assert_eq!(duration_beats, time(1, 10));
                assert_eq!(pitches.len(), 4);
            }
        }
    }
}
