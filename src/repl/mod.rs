//! Interactive progression sketcher
//!
//! Input lines are read on their own thread and handed over a channel so the
//! main loop can also react to file-watch events. Anything that is not a
//! command replaces the progression text.

use crate::audio::{AudioPlayerHandle, MidiOutputHandle};
use crate::commands::editor::{apply_text, describe, load_file};
use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::repl::watcher::FileWatcher;
use anyhow::{anyhow, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// What the loop should do after handling a line
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,

    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    watcher: Option<FileWatcher>,
}

impl Repl {
    /// Open whichever outputs are available. Missing devices are logged,
    /// not fatal.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| anyhow!("Failed to open line editor: {}", e))?;

        let audio_handle = match AudioPlayerHandle::new() {
            Ok(handle) => Some(Arc::new(handle)),
            Err(e) => {
                log::warn!("Audio output unavailable: {:#}", e);
                None
            }
        };
        let midi_handle = match MidiOutputHandle::new() {
            Ok(handle) => Some(Arc::new(handle)),
            Err(e) => {
                log::warn!("MIDI output unavailable: {:#}", e);
                None
            }
        };

        Ok(Self::with_context(
            Some(editor),
            CommandContext::new(audio_handle, midi_handle),
        ))
    }

    fn with_context(editor: Option<DefaultEditor>, ctx: CommandContext) -> Self {
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();
        Self {
            editor,
            registry: create_registry(),
            ctx,
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        }
    }

    /// Handle one line of input
    fn handle_line(&mut self, line: &str) -> Flow {
        if line.is_empty() {
            return Flow::Continue;
        }

        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => return Flow::Exit,
            CommandResult::Error(e) => println!("{} {}", "Error:".bright_red().bold(), e.red()),
            CommandResult::Watch(path) => self.watch(Path::new(&path)),
            CommandResult::NotACommand => match apply_text(line, &mut self.ctx) {
                CommandResult::Message(msg) => println!("{}", msg),
                CommandResult::Error(e) => {
                    println!("{} {}", "Error:".bright_red().bold(), e.red())
                }
                _ => {}
            },
        }
        Flow::Continue
    }

    /// Load a progression file now and reload it whenever it changes
    fn watch(&mut self, path: &Path) {
        self.reload(path);

        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }

        if let Some(w) = &mut self.watcher {
            match w.watch(path) {
                Ok(()) => println!(
                    "Watching {} for changes...",
                    path.display().to_string().bright_green()
                ),
                Err(e) => println!("{} Failed to watch {}: {}", "Error:".red(), path.display(), e),
            }
        }
    }

    fn reload(&mut self, path: &Path) {
        match load_file(path, &mut self.ctx) {
            Ok(()) => println!("{}", describe(&self.ctx.editor)),
            Err(e) => println!("{} {:#}", "Error:".red(), e),
        }
    }

    fn handle_watch_event(&mut self, event: Event) {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        for path in event.paths {
            println!("{} File changed: {}", "*".bright_yellow(), path.display());
            self.reload(&path);
        }
    }

    fn print_banner() {
        println!("{}", "codechord".bright_cyan().bold());
        println!(
            "Type a progression like {}, then {}.",
            "Dm7(comping)-G7(stabs)-Cmaj7(block)".cyan(),
            "play".bright_green()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );
    }

    fn spawn_input_thread(&mut self) -> Result<()> {
        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::Builder::new()
            .name("codechord-input".into())
            .spawn(move || loop {
                let prompt = format!("{} ", "codechord>".bright_magenta().bold());
                match editor.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if !line.is_empty() {
                            let _ = editor.add_history_entry(&line);
                        }
                        if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx_input.send(ReplEvent::Input(Err(err)));
                        break;
                    }
                }
            })?;
        Ok(())
    }

    /// Run the loop until the user quits or input closes
    pub fn run(&mut self, initial_file: Option<&Path>) -> Result<()> {
        Self::print_banner();
        if let Some(path) = initial_file {
            self.watch(path);
        }
        self.spawn_input_thread()?;

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if self.handle_line(&line) == Flow::Exit {
                            break;
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => break,
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break,
                },
                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_watch_event(event),
                    Ok(Err(e)) => println!("{} Watch error: {}", "Error:".red(), e),
                    Err(_) => break,
                }
            }
        }

        if let Err(e) = self.ctx.player.stop_and_silence() {
            log::warn!("Failed to stop playback on exit: {}", e);
        }
        println!("{}", "Goodbye!".bright_cyan());
        Ok(())
    }
}

/// Start the REPL, optionally loading and watching a progression file
pub fn start(initial_file: Option<PathBuf>) -> Result<()> {
    let mut repl = Repl::new()?;
    repl.run(initial_file.as_deref())
}
