#[cfg(test)]
mod tests {
    use codechord_core::arrangement::{arrange, total_beats};
    use codechord_core::editor::{parse, serialize, ProgressionEditor};
    use codechord_core::types::style::{expand, span};
    use codechord_core::types::time::{beats, time};
    use codechord_core::types::{resolve_chord_tones, ChordEntry, Progression, StyleTag};

    const SYMBOLS: &[&str] = &[
        "C", "Cm", "C7", "Cmaj7", "Cm7", "Cdim7", "Csus4", "C9", "F#m7b5", "Bb13", "XYZ123",
    ];

    #[test]
    fn test_every_style_stays_in_its_slot() {
        for symbol in SYMBOLS {
            let pitches = resolve_chord_tones(symbol);
            for style in StyleTag::ALL {
                let events = expand(style, &pitches);
                let overflow_allowed = style == StyleTag::Arpeggio && pitches.len() > 4;
                if !overflow_allowed {
                    assert!(span(&events) <= beats(1), "{}({})", symbol, style);
                }
                let offsets: Vec<_> = events.iter().map(|e| e.beat_offset).collect();
                let mut sorted = offsets.clone();
                sorted.sort();
                assert_eq!(offsets, sorted, "{}({}) not ordered", symbol, style);
            }
        }
    }

    #[test]
    fn test_resolver_never_returns_empty() {
        for symbol in SYMBOLS.iter().chain(["", "?", "H", "123"].iter()) {
            assert!(!resolve_chord_tones(symbol).is_empty(), "{:?}", symbol);
        }
    }

    #[test]
    fn test_fallback_triad() {
        let pitches = resolve_chord_tones("XYZ123");
        assert_eq!(pitches.len(), 3);
        assert_eq!(pitches[0].as_str(), "C4");
    }

    #[test]
    fn test_text_round_trip() {
        let text = "Cm7(comping)-F7(arpeggio)";
        let prog = parse(text, &Progression::new());
        assert_eq!(serialize(&prog), text);
        assert_eq!(parse(&serialize(&prog), &Progression::new()), prog);
    }

    #[test]
    fn test_export_and_playback_share_expansion() {
        let prog = parse("Dm7(comping3)-G7(rootThenComping2)-Cmaj7(block)", &Progression::new());
        let notes = arrange(&prog);

        let expected: usize = prog
            .iter()
            .map(|entry| {
                expand(entry.style, &entry.pitches())
                    .iter()
                    .map(|e| e.pitches.len())
                    .sum::<usize>()
            })
            .sum();
        assert_eq!(notes.len(), expected);
        assert_eq!(total_beats(&prog), beats(3));
        assert!(notes.iter().all(|n| n.end() <= beats(3)));

        // Root hit of G7 sits alone at the start of slot 1
        let at_slot_one: Vec<_> = notes.iter().filter(|n| n.start == beats(1)).collect();
        assert_eq!(at_slot_one.len(), 1);
        assert_eq!(at_slot_one[0].key, 67);
        assert_eq!(at_slot_one[0].duration, time(1, 5));
    }

    #[test]
    fn test_editor_drives_arrangement() {
        let mut editor = ProgressionEditor::from_text("C-G");
        let before = arrange(editor.progression()).len();
        editor.set_style(1, StyleTag::Comping4);
        let after = arrange(editor.progression()).len();
        assert_eq!(after, before + 2 * 3);

        editor.push(ChordEntry::new("Am", StyleTag::Block));
        assert_eq!(editor.text(), "C(comping)-G(comping4)-Am(block)");
    }
}
