//! Rhythmic styles and the style expander
//!
//! A style turns one chord's pitch set into the hits that fill its one-beat
//! slot. Offsets and durations are fixed fractions of a beat, independent of
//! tempo; playback and export scale them later.

use crate::types::chord_symbol::PitchSet;
use crate::types::time::{beats, time, Time};
use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// Velocity of every expanded hit (0.0-1.0)
pub const DEFAULT_VELOCITY: f32 = 0.9;

/// Length of the slot each chord occupies
pub const SLOT_BEATS: i64 = 1;

/// Rhythmic pattern applied to a chord within its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum StyleTag {
    /// Two sixteenth hits on the beat
    #[default]
    Comping,
    Comping3,
    Comping4,
    /// Root alone, then two chord hits on the off-beat sixteenths
    RootThenComping2,
    /// Chord tones one at a time, a sixteenth apart
    Arpeggio,
    /// One chord held for the whole beat
    Block,
    /// Two short chord hits on the beat and the off-beat
    Stabs,
}

impl StyleTag {
    pub const ALL: [StyleTag; 7] = [
        StyleTag::Comping,
        StyleTag::Comping3,
        StyleTag::Comping4,
        StyleTag::RootThenComping2,
        StyleTag::Arpeggio,
        StyleTag::Block,
        StyleTag::Stabs,
    ];

    /// Canonical tag as written in progression text
    pub fn tag(&self) -> &'static str {
        match self {
            StyleTag::Comping => "comping",
            StyleTag::Comping3 => "comping3",
            StyleTag::Comping4 => "comping4",
            StyleTag::RootThenComping2 => "rootThenComping2",
            StyleTag::Arpeggio => "arpeggio",
            StyleTag::Block => "block",
            StyleTag::Stabs => "stabs",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            StyleTag::Comping => "Comping",
            StyleTag::Comping3 => "Comping x3",
            StyleTag::Comping4 => "Comping x4",
            StyleTag::RootThenComping2 => "Root + Comping x2",
            StyleTag::Arpeggio => "Arpeggio",
            StyleTag::Block => "Block Chord",
            StyleTag::Stabs => "Stabs",
        }
    }
}

impl FromStr for StyleTag {
    type Err = anyhow::Error;

    /// Exact canonical tag first, then a case-insensitive match
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        StyleTag::ALL
            .iter()
            .find(|style| style.tag() == s)
            .or_else(|| {
                StyleTag::ALL
                    .iter()
                    .find(|style| style.tag().eq_ignore_ascii_case(s))
            })
            .copied()
            .ok_or_else(|| anyhow!("Unknown style: {}", s))
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What part of the chord an event sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteClass {
    /// Every chord tone at once
    Chord,
    /// The root alone
    Root,
    /// One chord tone of an arpeggio
    Arpeggio,
}

/// One hit inside a chord's slot
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub pitches: PitchSet,
    /// Offset from the start of the owning slot, in beats
    pub beat_offset: Time,
    pub duration_beats: Time,
    pub velocity: f32,
    pub class: NoteClass,
}

impl NoteEvent {
    fn new(pitches: PitchSet, beat_offset: Time, duration_beats: Time, class: NoteClass) -> Self {
        Self {
            pitches,
            beat_offset,
            duration_beats,
            velocity: DEFAULT_VELOCITY,
            class,
        }
    }

    /// Where this event stops sounding, relative to its slot
    pub fn end(&self) -> Time {
        self.beat_offset + self.duration_beats
    }
}

/// Length of a comping, arpeggio or root hit
fn short_hit() -> Time {
    time(1, 5)
}

/// Length of a stab
fn stab() -> Time {
    time(1, 10)
}

fn chord_hits(pitches: &PitchSet, offsets: &[Time], duration: Time) -> Vec<NoteEvent> {
    offsets
        .iter()
        .map(|&offset| NoteEvent::new(pitches.clone(), offset, duration, NoteClass::Chord))
        .collect()
}

/// Sixteenth positions 0, 1/4, 2/4, ... for `count` hits
fn sixteenths(count: i64) -> Vec<Time> {
    (0..count).map(|i| time(i, 4)).collect()
}

/// Expand one chord into the events of its slot.
///
/// Output is ordered by offset and fits inside one beat, except an arpeggio
/// over more than four pitches, which runs past the slot by a sixteenth per
/// extra pitch.
pub fn expand(style: StyleTag, pitches: &PitchSet) -> Vec<NoteEvent> {
    let root = match pitches.root() {
        Some(root) => root.clone(),
        None => return Vec::new(),
    };

    match style {
        StyleTag::Comping => chord_hits(pitches, &sixteenths(2), short_hit()),
        StyleTag::Comping3 => chord_hits(pitches, &sixteenths(3), short_hit()),
        StyleTag::Comping4 => chord_hits(pitches, &sixteenths(4), short_hit()),
        StyleTag::RootThenComping2 => {
            let mut events = vec![NoteEvent::new(
                PitchSet::new(vec![root]),
                beats(0),
                short_hit(),
                NoteClass::Root,
            )];
            events.extend(chord_hits(pitches, &[time(1, 2), time(3, 4)], short_hit()));
            events
        }
        StyleTag::Arpeggio => pitches
            .iter()
            .enumerate()
            .map(|(i, pitch)| {
                NoteEvent::new(
                    PitchSet::new(vec![pitch.clone()]),
                    time(i as i64, 4),
                    short_hit(),
                    NoteClass::Arpeggio,
                )
            })
            .collect(),
        StyleTag::Block => chord_hits(pitches, &[beats(0)], beats(SLOT_BEATS)),
        StyleTag::Stabs => chord_hits(pitches, &[beats(0), time(1, 2)], stab()),
    }
}

/// Simplified pattern for auditioning a single chord.
///
/// Only `block` and `arpeggio` keep their character; every other style is a
/// single chord hit. Offsets are in beats and scale with tempo: the 2/5 beat
/// arpeggio spacing is 0.2 s only at 120 BPM, and 0.24 s at the default
/// 100 BPM.
pub fn expand_preview(style: StyleTag, pitches: &PitchSet) -> Vec<NoteEvent> {
    if pitches.is_empty() {
        return Vec::new();
    }

    match style {
        StyleTag::Block => chord_hits(pitches, &[beats(0)], beats(4)),
        StyleTag::Arpeggio => pitches
            .iter()
            .enumerate()
            .map(|(i, pitch)| {
                NoteEvent::new(
                    PitchSet::new(vec![pitch.clone()]),
                    time(2 * i as i64, 5),
                    time(1, 2),
                    NoteClass::Arpeggio,
                )
            })
            .collect(),
        _ => chord_hits(pitches, &[beats(0)], time(1, 2)),
    }
}

/// Furthest point any event of an expansion reaches
pub fn span(events: &[NoteEvent]) -> Time {
    events.iter().map(|e| e.end()).max().unwrap_or_else(|| beats(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chord_symbol::resolve_chord_tones;

    fn offsets(events: &[NoteEvent]) -> Vec<Time> {
        events.iter().map(|e| e.beat_offset).collect()
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("comping".parse::<StyleTag>().unwrap(), StyleTag::Comping);
        assert_eq!(
            "rootThenComping2".parse::<StyleTag>().unwrap(),
            StyleTag::RootThenComping2
        );
        assert_eq!("BLOCK".parse::<StyleTag>().unwrap(), StyleTag::Block);
        assert!("swing".parse::<StyleTag>().is_err());
        assert!("".parse::<StyleTag>().is_err());
    }

    #[test]
    fn test_style_display_roundtrip() {
        for style in StyleTag::ALL {
            assert_eq!(style.to_string().parse::<StyleTag>().unwrap(), style);
        }
    }

    #[test]
    fn test_default_style_is_comping() {
        assert_eq!(StyleTag::default(), StyleTag::Comping);
    }

    #[test]
    fn test_comping_hits() {
        let chord = resolve_chord_tones("Cm7");
        let events = expand(StyleTag::Comping, &chord);
        assert_eq!(events.len(), 2);
        assert_eq!(offsets(&events), vec![time(0, 1), time(1, 4)]);
        assert!(events.iter().all(|e| e.pitches == chord));
        assert!(events.iter().all(|e| e.class == NoteClass::Chord));

        assert_eq!(expand(StyleTag::Comping3, &chord).len(), 3);
        assert_eq!(
            offsets(&expand(StyleTag::Comping4, &chord)),
            vec![time(0, 1), time(1, 4), time(1, 2), time(3, 4)]
        );
    }

    #[test]
    fn test_root_then_comping() {
        let chord = resolve_chord_tones("F7");
        let events = expand(StyleTag::RootThenComping2, &chord);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].class, NoteClass::Root);
        assert_eq!(events[0].pitches.len(), 1);
        assert_eq!(events[0].pitches[0].as_str(), "F4");
        assert_eq!(offsets(&events), vec![time(0, 1), time(1, 2), time(3, 4)]);
        assert_eq!(events[1].pitches, chord);
    }

    #[test]
    fn test_arpeggio_walks_pitches_in_order() {
        let chord = resolve_chord_tones("Bbmaj7");
        let events = expand(StyleTag::Arpeggio, &chord);
        assert_eq!(events.len(), 4);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.pitches.as_slice(), &[chord[i].clone()]);
            assert_eq!(event.beat_offset, time(i as i64, 4));
        }
        assert!(span(&events) <= beats(1));
    }

    #[test]
    fn test_long_arpeggio_overflows_slot() {
        let chord = resolve_chord_tones("C13");
        assert_eq!(chord.len(), 6);
        let events = expand(StyleTag::Arpeggio, &chord);
        assert_eq!(span(&events), time(5, 4) + time(1, 5));
        assert!(span(&events) > beats(1));
    }

    #[test]
    fn test_block_spans_full_beat() {
        let events = expand(StyleTag::Block, &resolve_chord_tones("Cmaj7"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].beat_offset, beats(0));
        assert_eq!(events[0].duration_beats, beats(1));
    }

    #[test]
    fn test_stabs_are_short() {
        let events = expand(StyleTag::Stabs, &resolve_chord_tones("G7"));
        assert_eq!(offsets(&events), vec![time(0, 1), time(1, 2)]);
        assert!(events.iter().all(|e| e.duration_beats == time(1, 10)));
    }

    #[test]
    fn test_all_styles_fit_in_slot() {
        for symbol in ["C", "Cm7", "C5", "Bbmaj7"] {
            let chord = resolve_chord_tones(symbol);
            for style in StyleTag::ALL {
                let events = expand(style, &chord);
                assert!(!events.is_empty());
                assert!(
                    span(&events) <= beats(1),
                    "{} over {} spans {}",
                    style,
                    symbol,
                    span(&events)
                );
                assert!(events.iter().all(|e| e.velocity == DEFAULT_VELOCITY));
            }
        }
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let chord = resolve_chord_tones("Dm9");
        for style in StyleTag::ALL {
            assert_eq!(expand(style, &chord), expand(style, &chord));
        }
    }

    #[test]
    fn test_empty_set_expands_to_nothing() {
        let empty = PitchSet::new(vec![]);
        for style in StyleTag::ALL {
            assert!(expand(style, &empty).is_empty());
            assert!(expand_preview(style, &empty).is_empty());
        }
    }

    #[test]
    fn test_preview_is_simplified() {
        let chord = resolve_chord_tones("Am7");

        let block = expand_preview(StyleTag::Block, &chord);
        assert_eq!(block.len(), 1);
        assert_eq!(block[0].duration_beats, beats(4));

        let arp = expand_preview(StyleTag::Arpeggio, &chord);
        assert_eq!(arp.len(), 4);
        assert_eq!(arp[3].beat_offset, time(6, 5));

        for style in [
            StyleTag::Comping,
            StyleTag::Comping4,
            StyleTag::RootThenComping2,
            StyleTag::Stabs,
        ] {
            let events = expand_preview(style, &chord);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].pitches, chord);
            assert_eq!(events[0].beat_offset, beats(0));
        }
    }
}
