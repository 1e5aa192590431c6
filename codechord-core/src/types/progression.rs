//! Ordered chord slots

use crate::types::chord_symbol::{resolve_chord_tones, PitchSet};
use crate::types::style::StyleTag;
use std::fmt;

/// One chord slot: free-text symbol plus the style it is played in
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChordEntry {
    pub symbol: String,
    pub style: StyleTag,
}

impl ChordEntry {
    pub fn new(symbol: impl Into<String>, style: StyleTag) -> Self {
        Self {
            symbol: symbol.into(),
            style,
        }
    }

    /// Resolve the symbol to pitches. Never cached, so edits to the symbol
    /// take effect on the next expansion.
    pub fn pitches(&self) -> PitchSet {
        resolve_chord_tones(&self.symbol)
    }
}

impl fmt::Display for ChordEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.symbol, self.style)
    }
}

/// Chord entries in slot order. Each entry owns one beat; its index is its
/// slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progression {
    entries: Vec<ChordEntry>,
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChordEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ChordEntry> {
        self.entries.get_mut(index)
    }

    pub fn push(&mut self, entry: ChordEntry) {
        self.entries.push(entry);
    }

    pub fn remove(&mut self, index: usize) -> Option<ChordEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChordEntry> {
        self.entries.iter()
    }

    /// Style of the slot at `index`, if there is one
    pub fn style_at(&self, index: usize) -> Option<StyleTag> {
        self.entries.get(index).map(|e| e.style)
    }
}

impl From<Vec<ChordEntry>> for Progression {
    fn from(entries: Vec<ChordEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<ChordEntry> for Progression {
    fn from_iter<I: IntoIterator<Item = ChordEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Progression {
    type Item = &'a ChordEntry;
    type IntoIter = std::slice::Iter<'a, ChordEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
