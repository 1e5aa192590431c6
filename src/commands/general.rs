//! General REPL commands (help, quit, watch)

use crate::commands::{CommandContext, CommandResult};
use codechord_core::types::chord_symbol::known_qualities;
use codechord_core::types::StyleTag;
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `watch [file]` command
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    CommandResult::Watch(args.to_string())
}

/// Chord quality suffixes as shown in help; the plain major triad is "maj"
fn quality_list() -> String {
    known_qualities()
        .map(|q| if q.is_empty() { "maj" } else { q })
        .collect::<Vec<_>>()
        .join(", ")
}

fn line(usage: &str, what: &str) {
    println!("  {:<28} {}", usage.cyan(), what);
}

/// Print help information
fn print_help() {
    println!("{}", "codechord".bold());
    println!("{}", "=========".bold());
    println!();
    println!("{}", "Progressions:".green());
    println!("  Type chords joined by '-', each with an optional (style):");
    println!("    {}", "Dm7(comping)-G7(stabs)-Cmaj7(block)".cyan());
    println!("  A chord typed without a style keeps the style its slot already had.");
    let tags: Vec<&str> = StyleTag::ALL.iter().map(|s| s.tag()).collect();
    println!("  Styles: {}", tags.join(", "));
    println!("  Qualities: {}", quality_list());
    println!();
    println!("{}", "Editing:".green());
    line("show", "Show the progression and its slots");
    line("chord <n> <symbol>", "Change the chord in slot n");
    line("style <n> <style>", "Change the style of slot n");
    line("styles", "Describe every style");
    line("add <symbol> [style]", "Append a chord");
    line("remove <n>", "Remove slot n");
    line("load <file>", "Load a progression file");
    line("watch <file>", "Load a file and reload it on save");
    println!();
    println!("{}", "Playback:".green());
    line("play", "Play the progression once");
    line("stop", "Stop playback");
    line("preview <n|symbol> [style]", "Audition one chord");
    line("tempo [bpm]", "Show or set tempo (1-400)");
    line("volume [db]", "Show or set volume (-24 to 0 dB)");
    line("waveform [name]", "sine, square, saw or triangle");
    line("envelope [preset]", "default, pluck, pad, perc or organ");
    line("export [file]", "Write a Standard MIDI File");
    println!();
    println!("{}", "MIDI:".green());
    line("midi devices", "List MIDI output ports");
    line("midi connect <port>", "Connect to a MIDI port");
    line("midi disconnect", "Disconnect MIDI");
    line("midi channel [1-16]", "Show or set the output channel");
    line("midi status", "Show MIDI status");
    line("midi panic", "All notes off");
    line("output [audio|midi|both]", "Choose where notes go");
    println!();
    println!("{}", "Other:".green());
    println!("  {:<28} Show this help", "help".bright_green());
    println!("  {:<28} Exit", "quit".bright_red());
}
