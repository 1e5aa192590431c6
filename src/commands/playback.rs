//! Playback, voice and export commands

use crate::commands::{CommandContext, CommandResult};
use crate::export::{write_midi_file, DEFAULT_FILE_NAME};
use codechord_core::types::settings::{MAX_BPM, MAX_VOLUME_DB, MIN_BPM, MIN_VOLUME_DB};
use codechord_core::types::{AdsrParams, StyleTag, Waveform};
use colored::*;

/// Handle `play`
pub fn cmd_play(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    if ctx.editor.is_empty() {
        return CommandResult::Error("Nothing to play. Type a progression first.".to_string());
    }
    ctx.editor.commit();
    match ctx.player.schedule_playback(
        ctx.editor.progression(),
        ctx.settings.bpm(),
        ctx.settings.volume_db(),
    ) {
        Ok(()) => CommandResult::Message(
            format!(
                "Playing {} chords at {} BPM",
                ctx.editor.len(),
                ctx.settings.bpm()
            )
            .bright_green()
            .to_string(),
        ),
        Err(e) => CommandResult::Error(format!("Failed to start playback: {}", e)),
    }
}

/// Handle `stop`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.player.stop_and_silence() {
        Ok(()) => CommandResult::Message("Stopped".yellow().to_string()),
        Err(e) => CommandResult::Error(format!("Failed to stop: {}", e)),
    }
}

/// Handle `preview <n>` or `preview <symbol> [style]`
pub fn cmd_preview(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (symbol, style) = match parts.as_slice() {
        [slot] if slot.parse::<usize>().is_ok() => {
            let entry = slot
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| ctx.editor.progression().get(i));
            match entry {
                Some(entry) => (entry.symbol.clone(), entry.style),
                None => return CommandResult::Error(format!("No chord in slot {}", slot)),
            }
        }
        [symbol] => (symbol.to_string(), StyleTag::default()),
        [symbol, tag] => match tag.parse::<StyleTag>() {
            Ok(style) => (symbol.to_string(), style),
            Err(e) => return CommandResult::Error(e.to_string()),
        },
        _ => {
            return CommandResult::Error("Usage: preview <n> | preview <symbol> [style]".to_string())
        }
    };

    ctx.player.set_volume_db(ctx.settings.volume_db());
    match ctx.player.preview_chord(&symbol, style, ctx.settings.bpm()) {
        Ok(()) => CommandResult::Message(format!(
            "Previewing {} ({})",
            symbol.cyan(),
            style.to_string().green()
        )),
        Err(e) => CommandResult::Error(format!("Failed to preview: {}", e)),
    }
}

/// Handle `tempo [bpm]`
pub fn cmd_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current tempo: {} BPM", ctx.settings.bpm()));
    }

    match args.parse::<u32>() {
        Ok(bpm) if (MIN_BPM..=MAX_BPM).contains(&bpm) => {
            ctx.settings.set_bpm(bpm);
            CommandResult::Message(format!("Tempo set to {} BPM", bpm).bright_green().to_string())
        }
        _ => CommandResult::Error(format!(
            "Invalid tempo. Use a whole number between {}-{} BPM",
            MIN_BPM, MAX_BPM
        )),
    }
}

/// Handle `volume [db]`
pub fn cmd_volume(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current volume: {} dB", ctx.settings.volume_db()));
    }

    match args.trim_end_matches("dB").trim().parse::<f32>() {
        Ok(db) if db.is_finite() => {
            ctx.settings.set_volume_db(db);
            let applied = ctx.settings.volume_db();
            ctx.player.set_volume_db(applied);
            let msg = if applied != db {
                format!(
                    "Volume clamped to {} dB (range {} to {})",
                    applied, MIN_VOLUME_DB, MAX_VOLUME_DB
                )
            } else {
                format!("Volume set to {} dB", applied)
            };
            CommandResult::Message(msg.bright_green().to_string())
        }
        _ => CommandResult::Error(format!(
            "Invalid volume. Use decibels between {} and {}",
            MIN_VOLUME_DB, MAX_VOLUME_DB
        )),
    }
}

/// Handle `waveform [name]`
pub fn cmd_waveform(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current waveform: {}", ctx.settings.waveform.name()));
    }
    let Some(waveform) = Waveform::from_str(args) else {
        let names: Vec<&str> = Waveform::ALL.iter().map(|w| w.name()).collect();
        return CommandResult::Error(format!("Unknown waveform. Choose one of: {}", names.join(", ")));
    };

    ctx.settings.waveform = waveform;
    if let Some(audio) = &ctx.audio_handle {
        if let Err(e) = audio.set_waveform(waveform) {
            return CommandResult::Error(e.to_string());
        }
    }
    CommandResult::Message(format!("Waveform set to {}", waveform.name().cyan()))
}

/// Handle `envelope [preset]`
pub fn cmd_envelope(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        let env = ctx.settings.envelope;
        return CommandResult::Message(format!(
            "Envelope: attack {}s, decay {}s, sustain {}, release {}s",
            env.attack, env.decay, env.sustain, env.release
        ));
    }
    let Some(envelope) = AdsrParams::from_preset(args) else {
        return CommandResult::Error(format!(
            "Unknown envelope preset. Choose one of: {}",
            AdsrParams::PRESETS.join(", ")
        ));
    };

    ctx.settings.envelope = envelope;
    if let Some(audio) = &ctx.audio_handle {
        if let Err(e) = audio.set_envelope(envelope) {
            return CommandResult::Error(e.to_string());
        }
    }
    CommandResult::Message(format!("Envelope set to {}", args.to_lowercase().cyan()))
}

/// Handle `export [file]`
pub fn cmd_export(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let path = if args.is_empty() { DEFAULT_FILE_NAME } else { args };
    ctx.editor.commit();
    match write_midi_file(path, ctx.editor.progression(), ctx.settings.bpm()) {
        Ok(()) => CommandResult::Message(
            format!(
                "Exported {} chords at {} BPM to {}",
                ctx.editor.len(),
                ctx.settings.bpm(),
                path
            )
            .bright_green()
            .to_string(),
        ),
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::editor::apply_text;
    use crate::commands::test_support::recording_context;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tempo_bounds() {
        let (mut ctx, _) = recording_context();
        assert!(matches!(cmd_tempo("140", &mut ctx), CommandResult::Message(_)));
        assert_eq!(ctx.settings.bpm(), 140);
        assert!(matches!(cmd_tempo("0", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_tempo("99.5", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_tempo("500", &mut ctx), CommandResult::Error(_)));
        assert_eq!(ctx.settings.bpm(), 140);
    }

    #[test]
    fn test_volume_is_clamped() {
        let (mut ctx, _) = recording_context();
        cmd_volume("-40", &mut ctx);
        assert_eq!(ctx.settings.volume_db(), -24.0);
        cmd_volume("-3 dB", &mut ctx);
        assert_eq!(ctx.settings.volume_db(), -3.0);
        assert!(matches!(cmd_volume("loud", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_voice_settings() {
        let (mut ctx, _) = recording_context();
        cmd_waveform("saw", &mut ctx);
        assert_eq!(ctx.settings.waveform, Waveform::Saw);
        cmd_envelope("pad", &mut ctx);
        assert_eq!(ctx.settings.envelope, AdsrParams::pad());
        assert!(matches!(cmd_waveform("noise", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_play_requires_progression() {
        let (mut ctx, _) = recording_context();
        assert!(matches!(cmd_play("", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_preview_slot_uses_its_style() {
        let (mut ctx, sink) = recording_context();
        apply_text("C-Am7(arpeggio)", &mut ctx);
        assert!(matches!(cmd_preview("2", &mut ctx), CommandResult::Message(_)));

        let triggers = sink.triggers.lock().unwrap();
        assert_eq!(triggers.len(), 4);
        assert!(triggers.iter().all(|(pitches, _, _)| pitches.len() == 1));
        assert_eq!(triggers[0].2, Duration::ZERO);
    }

    #[test]
    fn test_preview_symbol() {
        let (mut ctx, sink) = recording_context();
        assert!(matches!(cmd_preview("Fmaj7 block", &mut ctx), CommandResult::Message(_)));
        assert!(matches!(cmd_preview("9", &mut ctx), CommandResult::Error(_)));
        let triggers = sink.triggers.lock().unwrap();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].0.len(), 4);
    }

    #[test]
    fn test_play_then_stop() {
        let (mut ctx, sink) = recording_context();
        apply_text("C(block)-G(block)", &mut ctx);
        cmd_tempo("400", &mut ctx);
        assert!(matches!(cmd_play("", &mut ctx), CommandResult::Message(_)));
        thread::sleep(Duration::from_millis(50));
        assert!(matches!(cmd_stop("", &mut ctx), CommandResult::Message(_)));

        let after_stop = sink.triggers.lock().unwrap().len();
        thread::sleep(Duration::from_millis(400));
        assert_eq!(sink.triggers.lock().unwrap().len(), after_stop);
    }
}
