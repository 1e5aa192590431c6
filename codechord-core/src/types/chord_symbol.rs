//! Chord symbol resolution
//!
//! Turns a free-text chord symbol such as `"Cm7"` or `"Bbmaj9"` into the
//! ordered pitch set the style expander works on. Every chord tone is voiced
//! in octave 4 by letter name, so extensions above the octave fold down into
//! the same register as the triad.
//!
//! Resolution never fails. A symbol that does not parse still yields a
//! root / major third / fifth triad built on its leading note letter, or on C
//! when there is none.

use crate::types::note::intervals::*;
use crate::types::note::{Interval, Note, PitchName, MAX_ACCIDENTALS};
use std::fmt;
use std::ops::Index;

/// Octave every resolved chord tone is placed in
pub const CHORD_OCTAVE: i8 = 4;

/// Chord qualities by suffix. The first alias is the canonical spelling.
const CHORD_TYPES: &[(&[&str], &[Interval])] = &[
    (&["", "M", "maj", "major"], &[UNISON, MAJOR_THIRD, PERFECT_FIFTH]),
    (&["m", "min", "minor"], &[UNISON, MINOR_THIRD, PERFECT_FIFTH]),
    (&["dim", "o", "°"], &[UNISON, MINOR_THIRD, DIMINISHED_FIFTH]),
    (&["aug", "+"], &[UNISON, MAJOR_THIRD, AUGMENTED_FIFTH]),
    (&["5"], &[UNISON, PERFECT_FIFTH]),
    (&["sus2"], &[UNISON, MAJOR_SECOND, PERFECT_FIFTH]),
    (&["sus4", "sus"], &[UNISON, PERFECT_FOURTH, PERFECT_FIFTH]),
    (&["6", "M6", "maj6"], &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MAJOR_SIXTH]),
    (&["m6", "min6"], &[UNISON, MINOR_THIRD, PERFECT_FIFTH, MAJOR_SIXTH]),
    (&["7", "dom", "dom7"], &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH]),
    (
        &["maj7", "M7", "Maj7", "^7", "Δ", "Δ7"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MAJOR_SEVENTH],
    ),
    (
        &["m7", "min7"],
        &[UNISON, MINOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH],
    ),
    (
        &["mMaj7", "mM7", "mmaj7", "m^7"],
        &[UNISON, MINOR_THIRD, PERFECT_FIFTH, MAJOR_SEVENTH],
    ),
    (
        &["m7b5", "ø", "ø7", "h7"],
        &[UNISON, MINOR_THIRD, DIMINISHED_FIFTH, MINOR_SEVENTH],
    ),
    (
        &["dim7", "o7", "°7"],
        &[UNISON, MINOR_THIRD, DIMINISHED_FIFTH, DIMINISHED_SEVENTH],
    ),
    (
        &["7sus4", "7sus"],
        &[UNISON, PERFECT_FOURTH, PERFECT_FIFTH, MINOR_SEVENTH],
    ),
    (
        &["aug7", "+7", "7#5"],
        &[UNISON, MAJOR_THIRD, AUGMENTED_FIFTH, MINOR_SEVENTH],
    ),
    (&["7b5"], &[UNISON, MAJOR_THIRD, DIMINISHED_FIFTH, MINOR_SEVENTH]),
    (&["add9", "add2"], &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MAJOR_NINTH]),
    (&["madd9"], &[UNISON, MINOR_THIRD, PERFECT_FIFTH, MAJOR_NINTH]),
    (
        &["9"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH, MAJOR_NINTH],
    ),
    (
        &["maj9", "M9", "Maj9"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MAJOR_SEVENTH, MAJOR_NINTH],
    ),
    (
        &["m9", "min9"],
        &[UNISON, MINOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH, MAJOR_NINTH],
    ),
    (
        &["6/9", "69"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MAJOR_SIXTH, MAJOR_NINTH],
    ),
    (
        &["7b9"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH, MINOR_NINTH],
    ),
    (
        &["7#9"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH, AUGMENTED_NINTH],
    ),
    (
        &["7#11"],
        &[UNISON, MAJOR_THIRD, PERFECT_FIFTH, MINOR_SEVENTH, AUGMENTED_ELEVENTH],
    ),
    (
        &["11"],
        &[UNISON, PERFECT_FIFTH, MINOR_SEVENTH, MAJOR_NINTH, PERFECT_ELEVENTH],
    ),
    (
        &["m11", "min11"],
        &[
            UNISON,
            MINOR_THIRD,
            PERFECT_FIFTH,
            MINOR_SEVENTH,
            MAJOR_NINTH,
            PERFECT_ELEVENTH,
        ],
    ),
    (
        &["13"],
        &[
            UNISON,
            MAJOR_THIRD,
            PERFECT_FIFTH,
            MINOR_SEVENTH,
            MAJOR_NINTH,
            MAJOR_THIRTEENTH,
        ],
    ),
    (
        &["maj13", "M13"],
        &[
            UNISON,
            MAJOR_THIRD,
            PERFECT_FIFTH,
            MAJOR_SEVENTH,
            MAJOR_NINTH,
            MAJOR_THIRTEENTH,
        ],
    ),
    (
        &["m13", "min13"],
        &[
            UNISON,
            MINOR_THIRD,
            PERFECT_FIFTH,
            MINOR_SEVENTH,
            MAJOR_NINTH,
            MAJOR_THIRTEENTH,
        ],
    ),
];

/// Ordered chord tones. The root is always first and the set is never empty
/// when it comes out of [`resolve_chord_tones`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchSet {
    pitches: Vec<PitchName>,
}

impl PitchSet {
    pub fn new(pitches: Vec<PitchName>) -> Self {
        PitchSet { pitches }
    }

    /// Root pitch (element 0)
    pub fn root(&self) -> Option<&PitchName> {
        self.pitches.first()
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PitchName> {
        self.pitches.iter()
    }

    pub fn as_slice(&self) -> &[PitchName] {
        &self.pitches
    }

    /// MIDI keys of every pitch that has one, in set order
    pub fn midi_keys(&self) -> Vec<u8> {
        self.pitches.iter().filter_map(|p| p.midi()).collect()
    }
}

impl Index<usize> for PitchSet {
    type Output = PitchName;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pitches[index]
    }
}

impl From<Vec<PitchName>> for PitchSet {
    fn from(pitches: Vec<PitchName>) -> Self {
        PitchSet::new(pitches)
    }
}

impl fmt::Display for PitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.pitches.iter().map(|p| p.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Split a symbol into its root note (pitch class) and quality suffix
fn split_root(symbol: &str) -> Option<(Note, &str)> {
    let letter = symbol.chars().next()?;
    if !('A'..='G').contains(&letter) {
        return None;
    }

    let rest = &symbol[letter.len_utf8()..];
    let accidental_len = rest
        .find(|c: char| c != '#' && c != 'b')
        .unwrap_or(rest.len());

    let (accidentals, suffix) = rest.split_at(accidental_len);
    if accidentals.len() > MAX_ACCIDENTALS {
        return None;
    }
    let alteration: i8 = accidentals
        .chars()
        .map(|c| if c == '#' { 1i8 } else { -1i8 })
        .sum();

    let root = Note::new(letter, alteration, None).ok()?;
    Some((root, suffix))
}

/// Find the interval stack for a quality suffix
fn lookup_quality(suffix: &str) -> Option<&'static [Interval]> {
    CHORD_TYPES
        .iter()
        .find(|(aliases, _)| aliases.contains(&suffix))
        .map(|(_, intervals)| *intervals)
}

/// Stack intervals on a root and place every tone in the chord octave
fn build(root: Note, intervals: &[Interval]) -> PitchSet {
    intervals
        .iter()
        .map(|&interval| PitchName::from(root.transpose(interval).with_octave(CHORD_OCTAVE)))
        .collect::<Vec<_>>()
        .into()
}

/// Look up a chord symbol without falling back
pub fn lookup_chord(symbol: &str) -> Option<PitchSet> {
    let (root, suffix) = split_root(symbol.trim())?;
    let intervals = lookup_quality(suffix)?;
    Some(build(root, intervals))
}

/// Root for the fallback triad: a leading A-G with at most one accidental,
/// otherwise C.
fn fallback_root(symbol: &str) -> Note {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(letter) if ('A'..='G').contains(&letter) => {
            let alteration = match chars.next() {
                Some('#') => 1,
                Some('b') => -1,
                _ => 0,
            };
            Note::new(letter, alteration, None).unwrap_or(Note::C)
        }
        _ => Note::C,
    }
}

/// Resolve a chord symbol to its pitch set, falling back to a major triad on
/// the leading note letter when the symbol is not recognized.
pub fn resolve_chord_tones(symbol: &str) -> PitchSet {
    if let Some(pitches) = lookup_chord(symbol) {
        return pitches;
    }

    let root = fallback_root(symbol.trim());
    log::debug!(
        "Unrecognized chord symbol '{}', using {} major triad",
        symbol,
        root
    );
    build(root, &[UNISON, MAJOR_THIRD, PERFECT_FIFTH])
}

/// Canonical quality suffixes, for help output
pub fn known_qualities() -> impl Iterator<Item = &'static str> {
    CHORD_TYPES.iter().map(|(aliases, _)| aliases[0])
}
