//! Beat-clocked transport for progression playback
//!
//! A single thread owns a min-heap of [`ScheduledEvent`]s and sleeps until the
//! earliest one comes due. Tempo, the running flag and the cancellation
//! generation are atomics shared with the handle.
//!
//! Cancelling bumps the generation on the caller's thread while holding the
//! dispatch lock. Every event carries the generation it was queued under and
//! is dropped if that no longer matches, so once [`Transport::cancel`] returns
//! nothing queued before it can fire.

use super::sink::TriggerSink;
use anyhow::{anyhow, Result};
use codechord_core::types::time::{beats_to_seconds, Time};
use codechord_core::types::{ScheduledAction, ScheduledEvent};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Commands that can be sent to the transport thread
#[derive(Debug)]
enum TransportCommand {
    Schedule(Vec<ScheduledEvent>),
    Start,
    Stop,
    Clear,
    Shutdown,
}

/// State shared between the handle and the thread
struct Shared {
    /// BPM stored as bits for atomic operations
    bpm: AtomicU64,
    running: AtomicBool,
    generation: AtomicU64,
    /// Held while checking a generation and dispatching its event
    dispatch: Mutex<()>,
}

impl Shared {
    fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm.load(Ordering::Relaxed))
    }
}

pub struct Transport {
    shared: Arc<Shared>,
    command_tx: Sender<TransportCommand>,
    thread: Option<JoinHandle<()>>,
}

impl Transport {
    /// Spawn the transport thread. Triggers go to `sink`.
    pub fn new(bpm: f64, sink: Arc<dyn TriggerSink>) -> Self {
        let shared = Arc::new(Shared {
            bpm: AtomicU64::new(bpm.to_bits()),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            dispatch: Mutex::new(()),
        });
        let (command_tx, command_rx) = crossbeam_channel::bounded(64);

        let thread_shared = shared.clone();
        let thread = thread::spawn(move || {
            TransportThread::new(thread_shared, command_rx, sink).run();
        });

        Transport {
            shared,
            command_tx,
            thread: Some(thread),
        }
    }

    /// Queue actions at beat positions measured from the next start
    pub fn schedule(&self, events: Vec<(Time, ScheduledAction)>) -> Result<()> {
        let generation = self.generation();
        let events = events
            .into_iter()
            .map(|(beat, action)| ScheduledEvent::new(beat, action, generation))
            .collect();
        self.send(TransportCommand::Schedule(events))
    }

    /// Start counting beats from 0
    pub fn start(&self) -> Result<()> {
        self.shared.running.store(true, Ordering::SeqCst);
        self.send(TransportCommand::Start)
    }

    /// Halt the transport. Pending events stay queued.
    pub fn stop(&self) -> Result<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        self.send(TransportCommand::Stop)
    }

    /// Invalidate every pending event and empty the queue
    pub fn cancel(&self) -> Result<()> {
        {
            let _guard = self
                .shared
                .dispatch
                .lock()
                .map_err(|e| anyhow!("Failed to lock transport: {}", e))?;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.send(TransportCommand::Clear)
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.shared.bpm.store(bpm.to_bits(), Ordering::Relaxed);
    }

    pub fn bpm(&self) -> f64 {
        self.shared.bpm()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Current cancellation generation
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    fn send(&self, command: TransportCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| anyhow!("Transport thread is gone: {}", e))
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        let _ = self.command_tx.send(TransportCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct TransportThread {
    shared: Arc<Shared>,
    command_rx: Receiver<TransportCommand>,
    sink: Arc<dyn TriggerSink>,
    queue: BinaryHeap<ScheduledEvent>,
    /// Wall-clock instant of beat 0 and the tempo it was started at
    origin: Option<(Instant, f64)>,
}

impl TransportThread {
    fn new(
        shared: Arc<Shared>,
        command_rx: Receiver<TransportCommand>,
        sink: Arc<dyn TriggerSink>,
    ) -> Self {
        Self {
            shared,
            command_rx,
            sink,
            queue: BinaryHeap::new(),
            origin: None,
        }
    }

    fn run(&mut self) {
        loop {
            let command = match self.next_deadline() {
                Some(deadline) => {
                    match self
                        .command_rx
                        .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => {
                            self.dispatch_due();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.command_rx.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
            };

            if self.handle_command(command) {
                break;
            }
        }
    }

    /// When the earliest queued event is due, if the transport is running
    fn next_deadline(&self) -> Option<Instant> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return None;
        }
        let (start, bpm) = self.origin?;
        let next = self.queue.peek()?;
        Some(start + Duration::from_secs_f64(beats_to_seconds(next.beat, bpm)))
    }

    fn handle_command(&mut self, command: TransportCommand) -> bool {
        match command {
            TransportCommand::Schedule(events) => {
                let current = self.shared.generation.load(Ordering::SeqCst);
                self.queue
                    .extend(events.into_iter().filter(|e| e.generation == current));
            }
            TransportCommand::Start => {
                self.origin = Some((Instant::now(), self.shared.bpm()));
                self.shared.running.store(true, Ordering::SeqCst);
            }
            TransportCommand::Stop => {
                self.shared.running.store(false, Ordering::SeqCst);
                self.origin = None;
            }
            TransportCommand::Clear => {
                self.queue.clear();
            }
            TransportCommand::Shutdown => {
                self.shared.running.store(false, Ordering::SeqCst);
                return true;
            }
        }
        false
    }

    fn dispatch_due(&mut self) {
        let (start, bpm) = match self.origin {
            Some(origin) => origin,
            None => return,
        };
        let elapsed = start.elapsed().as_secs_f64();

        while let Some(next) = self.queue.peek() {
            if beats_to_seconds(next.beat, bpm) > elapsed {
                break;
            }
            let Some(event) = self.queue.pop() else {
                break;
            };

            let _guard = match self.shared.dispatch.lock() {
                Ok(guard) => guard,
                Err(e) => {
                    log::error!("Transport dispatch lock poisoned: {}", e);
                    return;
                }
            };
            if event.generation != self.shared.generation.load(Ordering::SeqCst) {
                continue;
            }

            match event.action {
                ScheduledAction::Trigger {
                    pitches,
                    duration_beats,
                } => {
                    let duration = Duration::from_secs_f64(beats_to_seconds(duration_beats, bpm));
                    self.sink.trigger(pitches.as_slice(), duration, Duration::ZERO);
                }
                ScheduledAction::Stop => {
                    log::info!("Playback finished at beat {}", event.beat);
                    self.shared.running.store(false, Ordering::SeqCst);
                    self.origin = None;
                    return;
                }
            }
        }
    }
}
