//! Command registry for REPL commands
//!
//! Commands are matched by longest prefix. Input that matches no command is
//! treated as progression text.

pub mod editor;
pub mod general;
pub mod midi;
pub mod playback;

use crate::audio::{AudioPlayerHandle, MidiOutputHandle, OutputMode, SinkRouter, TriggerSink};
use crate::playback::Player;
use codechord_core::editor::ProgressionEditor;
use codechord_core::types::PlaybackSettings;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, treat the line as progression text
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a file for changes
    Watch(String),
}

/// Everything a command handler can touch
pub struct CommandContext {
    pub editor: ProgressionEditor,
    pub settings: PlaybackSettings,
    pub player: Player,
    pub router: Arc<SinkRouter>,
    pub audio_handle: Option<Arc<AudioPlayerHandle>>,
    pub midi_handle: Option<Arc<MidiOutputHandle>>,
}

impl CommandContext {
    /// Build a context around whichever outputs could be opened
    pub fn new(
        audio_handle: Option<Arc<AudioPlayerHandle>>,
        midi_handle: Option<Arc<MidiOutputHandle>>,
    ) -> Self {
        let router = Arc::new(SinkRouter::new(
            audio_handle.clone().map(|h| h as Arc<dyn TriggerSink>),
            midi_handle.clone().map(|h| h as Arc<dyn TriggerSink>),
        ));
        if audio_handle.is_none() && router.set_mode(OutputMode::Midi).is_ok() {
            log::warn!("No audio output; routing to MIDI");
        }
        Self::with_router(router, audio_handle, midi_handle)
    }

    /// Build a context around an existing router
    pub fn with_router(
        router: Arc<SinkRouter>,
        audio_handle: Option<Arc<AudioPlayerHandle>>,
        midi_handle: Option<Arc<MidiOutputHandle>>,
    ) -> Self {
        let settings = PlaybackSettings::default();
        let player = Player::new(router.clone(), settings.bpm());
        Self {
            editor: ProgressionEditor::new(),
            settings,
            player,
            router,
            audio_handle,
            midi_handle,
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Progression editing
    registry.register("show", editor::cmd_show);
    registry.register("chord", editor::cmd_chord);
    registry.register("style", editor::cmd_style);
    registry.register("styles", editor::cmd_styles);
    registry.register("add", editor::cmd_add);
    registry.register("remove", editor::cmd_remove);
    registry.register("load", editor::cmd_load);

    // Playback and export
    registry.register("play", playback::cmd_play);
    registry.register("stop", playback::cmd_stop);
    registry.register("preview", playback::cmd_preview);
    registry.register("tempo", playback::cmd_tempo);
    registry.register("volume", playback::cmd_volume);
    registry.register("waveform", playback::cmd_waveform);
    registry.register("envelope", playback::cmd_envelope);
    registry.register("export", playback::cmd_export);

    // MIDI output
    registry.register("midi devices", midi::cmd_midi_devices);
    registry.register("midi connect", midi::cmd_midi_connect);
    registry.register("midi disconnect", midi::cmd_midi_disconnect);
    registry.register("midi channel", midi::cmd_midi_channel);
    registry.register("midi status", midi::cmd_midi_status);
    registry.register("midi panic", midi::cmd_midi_panic);
    registry.register("output", midi::cmd_output_mode);

    // General commands
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("watch", general::cmd_watch);

    registry
}


#[cfg(test)]
mod tests {
    use super::test_support::recording_context;
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let registry = create_registry();
        let (mut ctx, _) = recording_context();
        // "styles" must not be taken as "style" with argument "s"
        assert!(matches!(
            registry.execute("styles", &mut ctx),
            CommandResult::Message(_)
        ));
    }

    #[test]
    fn test_prefix_needs_word_boundary() {
        let registry = create_registry();
        let (mut ctx, _) = recording_context();
        assert!(matches!(
            registry.execute("Cm7-F7", &mut ctx),
            CommandResult::NotACommand
        ));
        assert!(matches!(
            registry.execute("playful", &mut ctx),
            CommandResult::NotACommand
        ));
    }

    #[test]
    fn test_quit_and_exit() {
        let registry = create_registry();
        let (mut ctx, _) = recording_context();
        assert!(matches!(registry.execute("quit", &mut ctx), CommandResult::Exit));
        assert!(matches!(registry.execute("exit", &mut ctx), CommandResult::Exit));
    }

    #[test]
    fn test_list_commands() {
        let registry = create_registry();
        let commands = registry.list_commands();
        assert!(commands.contains(&"midi connect"));
        assert!(commands.contains(&"export"));
    }
}
