use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// Letter names in staff order
const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// Semitone offset of each natural letter above C
const LETTER_SEMITONES: [i16; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Standard 12-tone equal temperament frequencies for the 4th octave (C4-B4)
/// Based on A4 = 440Hz standard tuning
const BASE_OCTAVE_FREQUENCIES: [f32; 12] = [
    261.63, // C4
    277.18, // C#4/Db4
    293.66, // D4
    311.13, // D#4/Eb4
    329.63, // E4
    349.23, // F4
    369.99, // F#4/Gb4
    392.00, // G4
    415.30, // G#4/Ab4
    440.00, // A4
    466.16, // A#4/Bb4
    493.88, // B4
];

/// Octave used for spelling arithmetic when a note has none
const REFERENCE_OCTAVE: i8 = 4;
/// Most sharps or flats a spelled note may carry
pub const MAX_ACCIDENTALS: usize = 2;

/// A spelled note: letter, accidental and optional octave.
///
/// Spelling is kept (Eb is not D#) so chord tones print the way a musician
/// writes them. A note without an octave is a pitch class and has no MIDI
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    step: u8,        // index into LETTERS
    alteration: i8,  // sharps positive, flats negative
    octave: Option<i8>,
}

/// A diatonic interval: letter steps plus exact semitone distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub steps: u8,
    pub semitones: i8,
}

impl Interval {
    pub const fn new(steps: u8, semitones: i8) -> Self {
        Interval { steps, semitones }
    }
}

pub mod intervals {
    use super::Interval;

    pub const UNISON: Interval = Interval::new(0, 0);
    pub const MAJOR_SECOND: Interval = Interval::new(1, 2);
    pub const MINOR_THIRD: Interval = Interval::new(2, 3);
    pub const MAJOR_THIRD: Interval = Interval::new(2, 4);
    pub const PERFECT_FOURTH: Interval = Interval::new(3, 5);
    pub const DIMINISHED_FIFTH: Interval = Interval::new(4, 6);
    pub const PERFECT_FIFTH: Interval = Interval::new(4, 7);
    pub const AUGMENTED_FIFTH: Interval = Interval::new(4, 8);
    pub const MAJOR_SIXTH: Interval = Interval::new(5, 9);
    pub const DIMINISHED_SEVENTH: Interval = Interval::new(6, 9);
    pub const MINOR_SEVENTH: Interval = Interval::new(6, 10);
    pub const MAJOR_SEVENTH: Interval = Interval::new(6, 11);
    pub const MINOR_NINTH: Interval = Interval::new(8, 13);
    pub const MAJOR_NINTH: Interval = Interval::new(8, 14);
    pub const AUGMENTED_NINTH: Interval = Interval::new(8, 15);
    pub const PERFECT_ELEVENTH: Interval = Interval::new(10, 17);
    pub const AUGMENTED_ELEVENTH: Interval = Interval::new(10, 18);
    pub const MAJOR_THIRTEENTH: Interval = Interval::new(12, 21);
}

impl Note {
    /// C with no octave
    pub const C: Note = Note {
        step: 0,
        alteration: 0,
        octave: None,
    };

    /// Create a note from a letter, an alteration in semitones and an octave
    pub fn new(letter: char, alteration: i8, octave: Option<i8>) -> Result<Self> {
        let step = LETTERS
            .iter()
            .position(|&l| l == letter.to_ascii_uppercase())
            .ok_or_else(|| anyhow!("Invalid note letter: {}", letter))?;

        Ok(Note {
            step: step as u8,
            alteration,
            octave,
        })
    }

    /// The letter name of this note
    pub fn letter(&self) -> char {
        LETTERS[self.step as usize]
    }

    /// Sharps (positive) or flats (negative) applied to the letter
    pub fn alteration(&self) -> i8 {
        self.alteration
    }

    pub fn octave(&self) -> Option<i8> {
        self.octave
    }

    /// Same spelling placed in a specific octave
    pub fn with_octave(self, octave: i8) -> Self {
        Note {
            octave: Some(octave),
            ..self
        }
    }

    /// Get the chromatic pitch class (0-11)
    pub fn pitch_class(&self) -> u8 {
        (LETTER_SEMITONES[self.step as usize] + self.alteration as i16).rem_euclid(12) as u8
    }

    /// Absolute semitone number, C-1 = 0. Spelling counts: B#4 sits above B4.
    fn absolute_semitone(&self, octave: i8) -> i16 {
        (octave as i16 + 1) * 12 + LETTER_SEMITONES[self.step as usize] + self.alteration as i16
    }

    /// MIDI note number (C4 = 60), or None without an octave or outside 0-127
    pub fn midi(&self) -> Option<u8> {
        let octave = self.octave?;
        let number = self.absolute_semitone(octave);
        if (0..=127).contains(&number) {
            Some(number as u8)
        } else {
            None
        }
    }

    /// Frequency in Hz, available whenever the note has a MIDI number
    pub fn frequency(&self) -> Option<f32> {
        let midi = self.midi()?;
        let base_freq = BASE_OCTAVE_FREQUENCIES[(midi % 12) as usize];
        let octave_diff = (midi / 12) as i32 - 5;
        Some(base_freq * 2.0_f32.powi(octave_diff))
    }

    /// Transpose by a spelled interval, keeping correct letter names
    /// (C up a minor third is Eb, never D#).
    pub fn transpose(self, interval: Interval) -> Note {
        let octave = self.octave.unwrap_or(REFERENCE_OCTAVE);
        let raw_step = self.step + interval.steps;
        let new_step = raw_step % 7;
        let new_octave = octave + (raw_step / 7) as i8;

        let target = self.absolute_semitone(octave) + interval.semitones as i16;
        let natural = (new_octave as i16 + 1) * 12 + LETTER_SEMITONES[new_step as usize];

        Note {
            step: new_step,
            alteration: (target - natural).clamp(i8::MIN as i16, i8::MAX as i16) as i8,
            octave: self.octave.map(|_| new_octave),
        }
    }
}

impl FromStr for Note {
    type Err = anyhow::Error;

    /// Parse scientific pitch notation: letter, up to two `#` or `b`,
    /// optional (possibly negative) octave. `"Eb4"`, `"F##"`, `"G-1"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();

        let letter = chars
            .next()
            .ok_or_else(|| anyhow!("Empty note name"))?;
        if !letter.is_ascii_uppercase() {
            return Err(anyhow!("Invalid note name: {}", s));
        }

        let rest = chars.as_str();
        let accidental_len = rest
            .find(|c: char| c != '#' && c != 'b')
            .unwrap_or(rest.len());
        let (accidentals, octave_part) = rest.split_at(accidental_len);
        if accidentals.len() > MAX_ACCIDENTALS {
            return Err(anyhow!("Too many accidentals: {}", s));
        }

        let alteration = accidentals
            .chars()
            .map(|c| if c == '#' { 1i8 } else { -1i8 })
            .sum();

        let octave = if octave_part.is_empty() {
            None
        } else {
            Some(
                octave_part
                    .parse::<i8>()
                    .map_err(|_| anyhow!("Invalid octave: {}", octave_part))?,
            )
        };

        Note::new(letter, alteration, octave)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())?;

        let accidental = if self.alteration >= 0 { '#' } else { 'b' };
        for _ in 0..self.alteration.unsigned_abs() {
            write!(f, "{}", accidental)?;
        }

        match self.octave {
            Some(octave) => write!(f, "{}", octave),
            None => Ok(()),
        }
    }
}

/// A pitch as text, the unit a chord's pitch set is made of.
///
/// Names are produced by the chord resolver, but nothing guarantees they map
/// to a playable key: consumers convert with [`PitchName::midi`] and skip the
/// ones that don't.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PitchName(String);

impl PitchName {
    pub fn new(name: impl Into<String>) -> Self {
        PitchName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a spelled note, if the name is well formed
    pub fn note(&self) -> Option<Note> {
        self.0.parse().ok()
    }

    /// Numeric MIDI key, or None when the name has no valid mapping
    pub fn midi(&self) -> Option<u8> {
        self.note().and_then(|n| n.midi())
    }

    pub fn frequency(&self) -> Option<f32> {
        self.note().and_then(|n| n.frequency())
    }
}

impl From<Note> for PitchName {
    fn from(note: Note) -> Self {
        PitchName(note.to_string())
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
