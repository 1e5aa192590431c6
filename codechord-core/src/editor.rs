//! Progression text parsing and the text/slot editor
//!
//! Text form: chord symbols joined by `-`, each optionally followed by
//! `(style)`. A chord written without a style keeps whatever style its slot
//! had before, so retyping a symbol does not reset a style chosen earlier.

use crate::types::progression::{ChordEntry, Progression};
use crate::types::style::StyleTag;

/// Separator between chords in progression text
pub const SEPARATOR: char = '-';

/// Split `symbol(style)` into its parts. Anything that is not exactly a
/// non-empty symbol followed by a recognized style in trailing parentheses is
/// `None`.
fn split_annotation(segment: &str) -> Option<(&str, StyleTag)> {
    let body = segment.strip_suffix(')')?;
    let open = body.rfind('(')?;
    let symbol = body[..open].trim();
    if symbol.is_empty() {
        return None;
    }
    let style = body[open + 1..].parse().ok()?;
    Some((symbol, style))
}

/// Parse progression text.
///
/// `previous` supplies the style of unannotated chords by slot index; slots
/// past its end get the default style.
pub fn parse(text: &str, previous: &Progression) -> Progression {
    text.split(SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| match split_annotation(segment) {
            Some((symbol, style)) => ChordEntry::new(symbol, style),
            None => {
                if segment.ends_with(')') {
                    log::debug!("Ignoring malformed style annotation in '{}'", segment);
                }
                ChordEntry::new(segment, previous.style_at(i).unwrap_or_default())
            }
        })
        .collect()
}

/// Canonical text: every chord annotated, joined by `-`
pub fn serialize(progression: &Progression) -> String {
    progression
        .iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Which side of the editor was edited last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSource {
    /// The raw text field; slots are derived from it
    #[default]
    Text,
    /// The structured slots; the text is derived from them
    Slots,
}

/// Keeps the text field and the structured slots in step.
///
/// Sync only ever flows away from the side that was edited. Typing keeps the
/// text exactly as written; slot edits rewrite the text canonically.
#[derive(Debug, Clone, Default)]
pub struct ProgressionEditor {
    text: String,
    progression: Progression,
    source: EditSource,
}

impl ProgressionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor seeded from text
    pub fn from_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.set_text(text);
        editor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn source(&self) -> EditSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.progression.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progression.is_empty()
    }

    /// Replace the text; slots are re-derived with the current styles as
    /// the fallback for unannotated chords
    pub fn set_text(&mut self, text: &str) {
        self.progression = parse(text, &self.progression);
        self.text = text.to_string();
        self.source = EditSource::Text;
    }

    /// Change the symbol in one slot. Returns false if the slot does not
    /// exist.
    pub fn set_symbol(&mut self, index: usize, symbol: &str) -> bool {
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.contains(SEPARATOR) {
            return false;
        }
        match self.progression.get_mut(index) {
            Some(entry) => {
                entry.symbol = symbol.to_string();
                self.sync_from_slots();
                true
            }
            None => false,
        }
    }

    /// Change the style of one slot. Returns false if the slot does not exist.
    pub fn set_style(&mut self, index: usize, style: StyleTag) -> bool {
        match self.progression.get_mut(index) {
            Some(entry) => {
                entry.style = style;
                self.sync_from_slots();
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, entry: ChordEntry) {
        self.progression.push(entry);
        self.sync_from_slots();
    }

    pub fn remove(&mut self, index: usize) -> Option<ChordEntry> {
        let removed = self.progression.remove(index)?;
        self.sync_from_slots();
        Some(removed)
    }

    /// The text field lost focus: rewrite it in canonical form
    pub fn commit(&mut self) {
        self.text = serialize(&self.progression);
    }

    fn sync_from_slots(&mut self) {
        self.text = serialize(&self.progression);
        self.source = EditSource::Slots;
    }
}
