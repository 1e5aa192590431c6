//! MIDI output and routing commands

use crate::audio::{MidiOutputHandle, OutputMode};
use crate::commands::{CommandContext, CommandResult};
use colored::*;

fn not_initialized() -> CommandResult {
    CommandResult::Error("MIDI output not initialized".to_string())
}

/// Handle `midi devices` command - list available MIDI output ports
pub fn cmd_midi_devices(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match MidiOutputHandle::list_ports() {
        Ok(ports) if ports.is_empty() => CommandResult::Message(
            "No MIDI output ports found. Make sure a MIDI device or virtual port is connected."
                .yellow()
                .to_string(),
        ),
        Ok(ports) => {
            let mut output = format!("{}\n", "Available MIDI Output Ports:".bold());
            for (i, port) in ports.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, port.cyan()));
            }
            output.push_str(&format!(
                "\n{} {}",
                "Use".dimmed(),
                "midi connect <port name>".green()
            ));
            CommandResult::Message(output)
        }
        Err(e) => CommandResult::Error(format!("Failed to list MIDI ports: {}", e)),
    }
}

/// Handle `midi connect <port>` command
pub fn cmd_midi_connect(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error(
            "Usage: midi connect <port name>\nUse 'midi devices' to see available ports"
                .to_string(),
        );
    }

    match &ctx.midi_handle {
        Some(handle) => match handle.connect(args) {
            Ok(name) => CommandResult::Message(format!("Connected to MIDI port: {}", name.green())),
            Err(e) => CommandResult::Error(format!("Failed to connect to '{}': {}", args, e)),
        },
        None => not_initialized(),
    }
}

/// Handle `midi disconnect` command
pub fn cmd_midi_disconnect(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.midi_handle {
        Some(handle) => match handle.disconnect() {
            Ok(()) => CommandResult::Message("Disconnected from MIDI".to_string()),
            Err(e) => CommandResult::Error(format!("Failed to disconnect: {}", e)),
        },
        None => not_initialized(),
    }
}

/// Handle `midi channel [1-16]` command
pub fn cmd_midi_channel(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(handle) = &ctx.midi_handle else {
        return not_initialized();
    };

    if args.is_empty() {
        return CommandResult::Message(format!("MIDI channel: {}", handle.channel() + 1));
    }

    match args.parse::<u8>() {
        Ok(ch) if (1..=16).contains(&ch) => match handle.set_channel(ch - 1) {
            Ok(()) => CommandResult::Message(
                format!("MIDI channel set to {}", ch).green().to_string(),
            ),
            Err(e) => CommandResult::Error(e.to_string()),
        },
        _ => CommandResult::Error("Usage: midi channel <1-16>".to_string()),
    }
}

/// Handle `midi status` command
pub fn cmd_midi_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(handle) = &ctx.midi_handle else {
        return not_initialized();
    };

    let mut output = format!("{}\n", "MIDI Status:".bold());
    match handle.connected_port() {
        Some(name) => {
            output.push_str(&format!("  Status: {}\n", "Connected".green().bold()));
            output.push_str(&format!("  Port: {}\n", name.cyan()));
        }
        None => output.push_str(&format!("  Status: {}\n", "Not connected".yellow())),
    }
    output.push_str(&format!("  Channel: {}\n", handle.channel() + 1));
    output.push_str(&format!("  Output: {}", ctx.router.mode().name()));
    CommandResult::Message(output)
}

/// Handle `midi panic` command - All Notes Off on every channel
pub fn cmd_midi_panic(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.midi_handle {
        Some(handle) => match handle.panic() {
            Ok(()) => CommandResult::Message(
                "MIDI Panic: All Notes Off sent to all channels"
                    .yellow()
                    .to_string(),
            ),
            Err(e) => CommandResult::Error(format!("Failed to send MIDI panic: {}", e)),
        },
        None => not_initialized(),
    }
}

/// Handle `output [audio|midi|both]` command
pub fn cmd_output_mode(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Output mode: {}", ctx.router.mode().name().cyan()));
    }

    let Some(mode) = OutputMode::from_str(args) else {
        return CommandResult::Error(
            "Usage: output <audio|midi|both>\n  audio - Internal synth only\n  midi  - MIDI output only\n  both  - Both"
                .to_string(),
        );
    };

    // Release anything the outgoing route is still holding
    if let Err(e) = ctx.player.stop_and_silence() {
        log::warn!("Failed to stop before switching output: {}", e);
    }
    match ctx.router.set_mode(mode) {
        Ok(()) => CommandResult::Message(format!("Output mode: {}", mode.name()).green().to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}
