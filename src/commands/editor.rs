//! Progression editing commands

use crate::commands::{CommandContext, CommandResult};
use anyhow::{Context, Result};
use codechord_core::editor::{ProgressionEditor, SEPARATOR};
use codechord_core::types::{ChordEntry, StyleTag};
use colored::*;
use std::fs;
use std::path::Path;

/// Numbered slot listing with resolved pitches
pub fn describe(editor: &ProgressionEditor) -> String {
    if editor.is_empty() {
        return "(empty progression)".dimmed().to_string();
    }

    let mut output = format!("{} {}\n", "Progression:".bold(), editor.text().cyan());
    for (i, entry) in editor.progression().iter().enumerate() {
        output.push_str(&format!(
            "  {:>2}. {:<10} {:<18} {}\n",
            i + 1,
            entry.symbol.bright_white(),
            format!("({})", entry.style).green(),
            entry.pitches().to_string().dimmed()
        ));
    }
    output.trim_end().to_string()
}

/// Treat a raw input line as progression text
pub fn apply_text(line: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.editor.set_text(line);
    CommandResult::Message(describe(&ctx.editor))
}

/// Parse a 1-based slot number into an index
fn parse_slot(arg: &str, len: usize) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Ok(n - 1),
        _ if len == 0 => Err("The progression is empty".to_string()),
        _ => Err(format!("Slot must be a number from 1 to {}", len)),
    }
}

/// Progression text from a file: one or more lines of chords, `#` comments
/// and blank lines ignored, lines joined as consecutive chords
pub fn progression_text_from_file(contents: &str) -> String {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Read a progression file into the editor
pub fn load_file(path: &Path, ctx: &mut CommandContext) -> Result<()> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ctx.editor.set_text(&progression_text_from_file(&contents));
    log::info!("Loaded {} chords from {}", ctx.editor.len(), path.display());
    Ok(())
}

/// Handle `show`
pub fn cmd_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(describe(&ctx.editor))
}

/// Handle `chord <n> <symbol>`
pub fn cmd_chord(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some((slot, symbol)) = args.split_once(char::is_whitespace) else {
        return CommandResult::Error("Usage: chord <n> <symbol>".to_string());
    };
    let index = match parse_slot(slot, ctx.editor.len()) {
        Ok(index) => index,
        Err(e) => return CommandResult::Error(e),
    };
    if ctx.editor.set_symbol(index, symbol) {
        CommandResult::Message(describe(&ctx.editor))
    } else {
        CommandResult::Error(format!("Invalid chord symbol: '{}'", symbol.trim()))
    }
}

/// Handle `style <n> <tag>`
pub fn cmd_style(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        return CommandResult::Error("Usage: style <n> <tag>  (see 'styles')".to_string());
    }
    let index = match parse_slot(parts[0], ctx.editor.len()) {
        Ok(index) => index,
        Err(e) => return CommandResult::Error(e),
    };
    match parts[1].parse::<StyleTag>() {
        Ok(style) => {
            ctx.editor.set_style(index, style);
            CommandResult::Message(describe(&ctx.editor))
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `styles`
pub fn cmd_styles(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let mut output = format!("{}\n", "Styles:".bold());
    for style in StyleTag::ALL {
        output.push_str(&format!("  {:<18} {}\n", style.tag().cyan(), style.label()));
    }
    CommandResult::Message(output.trim_end().to_string())
}

/// Handle `add <symbol> [style]`
pub fn cmd_add(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (symbol, style) = match parts.as_slice() {
        [symbol] => (*symbol, StyleTag::default()),
        [symbol, tag] => match tag.parse::<StyleTag>() {
            Ok(style) => (*symbol, style),
            Err(e) => return CommandResult::Error(e.to_string()),
        },
        _ => return CommandResult::Error("Usage: add <symbol> [style]".to_string()),
    };
    if symbol.contains(SEPARATOR) {
        return CommandResult::Error(format!("Invalid chord symbol: '{}'", symbol));
    }
    ctx.editor.push(ChordEntry::new(symbol, style));
    CommandResult::Message(describe(&ctx.editor))
}

/// Handle `remove <n>`
pub fn cmd_remove(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match parse_slot(args, ctx.editor.len()) {
        Ok(index) => {
            ctx.editor.remove(index);
            CommandResult::Message(describe(&ctx.editor))
        }
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `load <file>`
pub fn cmd_load(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: load <file>".to_string());
    }
    match load_file(Path::new(args), ctx) {
        Ok(()) => CommandResult::Message(describe(&ctx.editor)),
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::recording_context;

    #[test]
    fn test_text_input_sets_progression() {
        let (mut ctx, _) = recording_context();
        assert!(matches!(
            apply_text("Cm7(comping)-F7(arpeggio)", &mut ctx),
            CommandResult::Message(_)
        ));
        assert_eq!(ctx.editor.len(), 2);
        assert_eq!(ctx.editor.text(), "Cm7(comping)-F7(arpeggio)");
    }

    #[test]
    fn test_chord_and_style_commands() {
        let (mut ctx, _) = recording_context();
        apply_text("C-G", &mut ctx);

        assert!(matches!(cmd_chord("2 G7", &mut ctx), CommandResult::Message(_)));
        assert!(matches!(cmd_style("1 block", &mut ctx), CommandResult::Message(_)));
        assert_eq!(ctx.editor.text(), "C(block)-G7(comping)");

        assert!(matches!(cmd_style("1 swing", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_style("3 block", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_chord("0 Am", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_chord("1", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_add_and_remove() {
        let (mut ctx, _) = recording_context();
        cmd_add("Dm7 stabs", &mut ctx);
        cmd_add("G7", &mut ctx);
        assert_eq!(ctx.editor.text(), "Dm7(stabs)-G7(comping)");
        cmd_remove("1", &mut ctx);
        assert_eq!(ctx.editor.text(), "G7(comping)");
        assert!(matches!(cmd_remove("5", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_file_text() {
        let contents = "# turnaround\nDm7(comping) - G7\n\nCmaj7(block)\n";
        assert_eq!(
            progression_text_from_file(contents),
            "Dm7(comping) - G7-Cmaj7(block)"
        );
    }

    #[test]
    fn test_describe_empty() {
        let (ctx, _) = recording_context();
        assert!(describe(&ctx.editor).contains("empty"));
    }
}
