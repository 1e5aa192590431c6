//! Standard MIDI File export
//!
//! Format 0, one track, 480 ticks per quarter note. The track holds a tempo
//! meta event, a note-on/note-off pair per arranged note and end-of-track.

use anyhow::{anyhow, Context, Result};
use codechord_core::arrangement::arrange;
use codechord_core::types::time::to_ticks;
use codechord_core::types::Progression;
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs;
use std::path::Path;

pub const TICKS_PER_QUARTER: u16 = 480;
/// Tempo written when none is given
pub const DEFAULT_EXPORT_BPM: u32 = 120;
/// File name used by the `export` command
pub const DEFAULT_FILE_NAME: &str = "composition.mid";
const CHANNEL: u8 = 0;

/// Serialize a progression at the default export tempo
pub fn export_midi(progression: &Progression) -> Result<Vec<u8>> {
    export_midi_with_tempo(progression, DEFAULT_EXPORT_BPM)
}

/// Serialize a progression with `bpm` in the tempo meta event
pub fn export_midi_with_tempo(progression: &Progression, bpm: u32) -> Result<Vec<u8>> {
    if bpm == 0 {
        return Err(anyhow!("Tempo must be positive"));
    }
    let microseconds_per_quarter = 60_000_000 / bpm;

    let mut events = vec![TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(microseconds_per_quarter.into())),
    }];

    // Deltas hold absolute ticks until converted below
    for note in arrange(progression) {
        let start = to_ticks(note.start, TICKS_PER_QUARTER);
        let end = to_ticks(note.end(), TICKS_PER_QUARTER);
        events.push(TrackEvent {
            delta: start.into(),
            kind: TrackEventKind::Midi {
                channel: CHANNEL.into(),
                message: MidiMessage::NoteOn {
                    key: note.key.into(),
                    vel: note.midi_velocity().into(),
                },
            },
        });
        events.push(TrackEvent {
            delta: end.into(),
            kind: TrackEventKind::Midi {
                channel: CHANNEL.into(),
                message: MidiMessage::NoteOff {
                    key: note.key.into(),
                    vel: 0.into(),
                },
            },
        });
    }

    // Stable sort keeps the tempo first and each note-on before its note-off
    events.sort_by_key(|e| e.delta.as_int());
    convert_to_delta_times(&mut events);
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(TICKS_PER_QUARTER.into()),
        },
        tracks: vec![events],
    };

    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| anyhow!("Failed to write MIDI: {}", e))?;
    Ok(out)
}

/// Export a progression to a file
pub fn write_midi_file(path: impl AsRef<Path>, progression: &Progression, bpm: u32) -> Result<()> {
    let path = path.as_ref();
    let bytes = export_midi_with_tempo(progression, bpm)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} chords to {}", progression.len(), path.display());
    Ok(())
}

/// Convert absolute tick times to delta times (time since previous event)
fn convert_to_delta_times(events: &mut [TrackEvent]) {
    let mut prev_tick = 0u32;
    for event in events.iter_mut() {
        let current_tick = event.delta.as_int();
        event.delta = current_tick.saturating_sub(prev_tick).into();
        prev_tick = current_tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codechord_core::editor::parse;

    fn note_ons(smf: &Smf) -> Vec<(u32, u8, u8)> {
        let mut tick = 0;
        let mut found = Vec::new();
        for event in &smf.tracks[0] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } = event.kind
            {
                found.push((tick, key.as_int(), vel.as_int()));
            }
        }
        found
    }

    #[test]
    fn test_header() {
        let bytes = export_midi(&parse("C", &Progression::new())).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.header.timing, Timing::Metrical(480.into()));
        assert_eq!(smf.tracks.len(), 1);
    }

    #[test]
    fn test_tempo_meta() {
        let bytes = export_midi_with_tempo(&Progression::new(), 100).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(600_000.into()))
        );
        assert!(export_midi_with_tempo(&Progression::new(), 0).is_err());
    }

    #[test]
    fn test_comping_ticks() {
        let bytes = export_midi(&parse("C(comping)", &Progression::new())).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let ticks: Vec<u32> = note_ons(&smf).iter().map(|(t, _, _)| *t).collect();
        assert_eq!(ticks, vec![0, 0, 0, 120, 120, 120]);
        assert!(note_ons(&smf).iter().all(|(_, _, vel)| *vel == 114));
    }

    #[test]
    fn test_events_end_with_end_of_track() {
        let bytes = export_midi(&parse("Am-F(stabs)", &Progression::new())).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(
            smf.tracks[0].last().map(|e| e.kind),
            Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
        );
    }
}
