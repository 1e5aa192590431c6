//! Live MIDI output
//!
//! The connection lives on its own thread, which also holds a time-ordered
//! queue of outgoing messages so note-offs (and delayed note-ons from chord
//! previews) go out on time without blocking the caller.

use super::sink::TriggerSink;
use anyhow::{anyhow, Result};
use codechord_core::types::settings::db_to_gain;
use codechord_core::types::{PitchName, DEFAULT_VELOCITY};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use midir::{MidiOutput, MidiOutputConnection};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::RwLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const CLIENT_NAME: &str = "Codechord";
/// Controller number for channel volume
const CC_VOLUME: u8 = 7;
/// Controller number for All Notes Off
const CC_ALL_NOTES_OFF: u8 = 123;

pub fn note_on(channel: u8, key: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), key & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, key: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), key & 0x7F, 0]
}

pub fn control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]
}

/// Velocity every triggered note is sent with
pub fn trigger_velocity() -> u8 {
    (DEFAULT_VELOCITY * 127.0).round() as u8
}

/// A message waiting for its send time
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    at: Instant,
    message: [u8; 3],
}

impl Pending {
    fn is_note_on(&self) -> bool {
        self.message[0] & 0xF0 == 0x90
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    /// Earliest first; at equal times note-offs go before note-ons so a
    /// re-struck key is not cut off
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.is_note_on().cmp(&self.is_note_on()))
    }
}

enum MidiCommand {
    Connect {
        port_name: String,
        reply: Sender<Result<String>>,
    },
    Disconnect,
    Schedule(Vec<Pending>),
    Send([u8; 3]),
    Silence,
    Shutdown,
}

/// Owns the connection and the outgoing queue
struct MidiThread {
    connection: Option<MidiOutputConnection>,
    command_rx: Receiver<MidiCommand>,
    queue: BinaryHeap<Pending>,
    /// (channel, key) of notes currently on
    sounding: HashSet<(u8, u8)>,
}

impl MidiThread {
    fn new(command_rx: Receiver<MidiCommand>) -> Self {
        Self {
            connection: None,
            command_rx,
            queue: BinaryHeap::new(),
            sounding: HashSet::new(),
        }
    }

    fn connect(&mut self, port_name: &str) -> Result<String> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let ports = midi_out.ports();
        let port = ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|name| name.contains(port_name))
                    .unwrap_or(false)
            })
            .ok_or_else(|| anyhow!("MIDI port '{}' not found", port_name))?;

        let actual_name = midi_out.port_name(port)?;
        let connection = midi_out
            .connect(port, "codechord-out")
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", actual_name, e))?;
        self.release_all();
        self.connection = Some(connection);
        Ok(actual_name)
    }

    fn send(&mut self, message: [u8; 3]) {
        let status = message[0];
        match status & 0xF0 {
            0x90 => {
                self.sounding.insert((status & 0x0F, message[1]));
            }
            0x80 => {
                self.sounding.remove(&(status & 0x0F, message[1]));
            }
            _ => {}
        }
        if let Some(conn) = &mut self.connection {
            if let Err(e) = conn.send(&message) {
                log::error!("MIDI send failed: {}", e);
            }
        }
    }

    /// Drop everything queued and turn off every sounding note
    fn release_all(&mut self) {
        self.queue.clear();
        let sounding: Vec<(u8, u8)> = self.sounding.drain().collect();
        for (channel, key) in sounding {
            self.send(note_off(channel, key));
        }
    }

    fn flush_due(&mut self) {
        let now = Instant::now();
        while self.queue.peek().is_some_and(|p| p.at <= now) {
            if let Some(pending) = self.queue.pop() {
                self.send(pending.message);
            }
        }
    }

    fn run(&mut self) {
        loop {
            let received = match self.queue.peek() {
                Some(next) => {
                    let wait = next.at.saturating_duration_since(Instant::now());
                    match self.command_rx.recv_timeout(wait) {
                        Ok(cmd) => Some(cmd),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.command_rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                },
            };

            if let Some(cmd) = received {
                match cmd {
                    MidiCommand::Connect { port_name, reply } => {
                        let _ = reply.send(self.connect(&port_name));
                    }
                    MidiCommand::Disconnect => {
                        self.release_all();
                        self.connection = None;
                    }
                    MidiCommand::Schedule(messages) => self.queue.extend(messages),
                    MidiCommand::Send(message) => self.send(message),
                    MidiCommand::Silence => self.release_all(),
                    MidiCommand::Shutdown => {
                        self.release_all();
                        if let Some(conn) = &mut self.connection {
                            for ch in 0..16u8 {
                                let _ = conn.send(&control_change(ch, CC_ALL_NOTES_OFF, 0));
                            }
                        }
                        break;
                    }
                }
            }

            self.flush_due();
        }
    }
}

/// Thread-safe handle to the MIDI output
pub struct MidiOutputHandle {
    command_tx: Sender<MidiCommand>,
    thread: Option<JoinHandle<()>>,
    /// Output channel (0-15)
    channel: AtomicU8,
    /// Name of the connected port
    port_name: RwLock<Option<String>>,
}

impl MidiOutputHandle {
    /// Create a new MIDI output handle (not connected to any port yet)
    pub fn new() -> Result<Self> {
        let (tx, rx) = unbounded();
        let thread = thread::Builder::new()
            .name("codechord-midi".into())
            .spawn(move || MidiThread::new(rx).run())?;

        Ok(Self {
            command_tx: tx,
            thread: Some(thread),
            channel: AtomicU8::new(0),
            port_name: RwLock::new(None),
        })
    }

    /// List available MIDI output ports.
    /// Creating the client can fail transiently on macOS, so this retries.
    pub fn list_ports() -> Result<Vec<String>> {
        let mut last_err = None;
        for attempt in 0..3 {
            if attempt > 0 {
                thread::sleep(Duration::from_millis(100));
            }
            match MidiOutput::new(CLIENT_NAME) {
                Ok(midi_out) => {
                    return Ok(midi_out
                        .ports()
                        .iter()
                        .filter_map(|p| midi_out.port_name(p).ok())
                        .collect());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(anyhow!(
            "MIDI initialization failed after 3 attempts: {:?}",
            last_err
        ))
    }

    /// Connect to the first port whose name contains `port_name`.
    /// Returns the full port name.
    pub fn connect(&self, port_name: &str) -> Result<String> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(MidiCommand::Connect {
            port_name: port_name.to_string(),
            reply: reply_tx,
        })?;
        let actual_name = reply_rx
            .recv()
            .map_err(|_| anyhow!("MIDI thread exited while connecting"))??;

        log::info!("Connected to MIDI port {}", actual_name);
        if let Ok(mut stored) = self.port_name.write() {
            *stored = Some(actual_name.clone());
        }
        Ok(actual_name)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.send(MidiCommand::Disconnect)?;
        if let Ok(mut stored) = self.port_name.write() {
            *stored = None;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected_port().is_some()
    }

    pub fn connected_port(&self) -> Option<String> {
        self.port_name.read().ok().and_then(|name| name.clone())
    }

    /// Output channel, 0-based
    pub fn channel(&self) -> u8 {
        self.channel.load(AtomicOrdering::Relaxed)
    }

    pub fn set_channel(&self, channel: u8) -> Result<()> {
        if channel > 15 {
            return Err(anyhow!("MIDI channel must be 1-16"));
        }
        self.channel.store(channel, AtomicOrdering::Relaxed);
        Ok(())
    }

    /// All Notes Off on every channel
    pub fn panic(&self) -> Result<()> {
        self.send(MidiCommand::Silence)?;
        for ch in 0..16u8 {
            self.send(MidiCommand::Send(control_change(ch, CC_ALL_NOTES_OFF, 0)))?;
        }
        Ok(())
    }

    fn send(&self, command: MidiCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| anyhow!("MIDI thread is not running"))
    }
}

impl TriggerSink for MidiOutputHandle {
    fn trigger(&self, pitches: &[PitchName], duration: Duration, delay: Duration) {
        if !self.is_connected() {
            return;
        }

        let channel = self.channel();
        let velocity = trigger_velocity();
        let start = Instant::now() + delay;
        let end = start + duration;

        let mut messages = Vec::with_capacity(pitches.len() * 2);
        for pitch in pitches {
            match pitch.midi() {
                Some(key) => {
                    messages.push(Pending {
                        at: start,
                        message: note_on(channel, key, velocity),
                    });
                    messages.push(Pending {
                        at: end,
                        message: note_off(channel, key),
                    });
                }
                None => log::debug!("Skipping {}: no MIDI key", pitch),
            }
        }

        if let Err(e) = self.send(MidiCommand::Schedule(messages)) {
            log::error!("{}", e);
        }
    }

    fn set_volume_db(&self, db: f32) {
        let value = (db_to_gain(db) * 127.0).round().clamp(0.0, 127.0) as u8;
        let message = control_change(self.channel(), CC_VOLUME, value);
        if let Err(e) = self.send(MidiCommand::Send(message)) {
            log::error!("{}", e);
        }
    }

    fn silence(&self) {
        let _ = self.send(MidiCommand::Silence);
    }
}

impl Drop for MidiOutputHandle {
    fn drop(&mut self) {
        let _ = self.command_tx.send(MidiCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bytes() {
        assert_eq!(note_on(0, 60, 100), [0x90, 60, 100]);
        assert_eq!(note_on(15, 60, 100), [0x9F, 60, 100]);
        assert_eq!(note_off(2, 64), [0x82, 64, 0]);
        assert_eq!(control_change(0, 123, 0), [0xB0, 123, 0]);
        // Out-of-range data bytes are masked
        assert_eq!(note_on(16, 200, 255), [0x90, 72, 127]);
    }

    #[test]
    fn test_trigger_velocity() {
        assert_eq!(trigger_velocity(), 114);
    }

    #[test]
    fn test_pending_order() {
        let now = Instant::now();
        let mut queue = BinaryHeap::new();
        queue.push(Pending {
            at: now + Duration::from_millis(10),
            message: note_on(0, 60, 100),
        });
        queue.push(Pending {
            at: now + Duration::from_millis(10),
            message: note_off(0, 60),
        });
        queue.push(Pending {
            at: now,
            message: note_on(0, 64, 100),
        });

        assert_eq!(queue.pop().map(|p| p.message), Some(note_on(0, 64, 100)));
        assert_eq!(queue.pop().map(|p| p.message), Some(note_off(0, 60)));
        assert_eq!(queue.pop().map(|p| p.message), Some(note_on(0, 60, 100)));
    }

    #[test]
    fn test_channel_setting() {
        let handle = MidiOutputHandle::new().unwrap();
        assert_eq!(handle.channel(), 0);
        handle.set_channel(9).unwrap();
        assert_eq!(handle.channel(), 9);
        assert!(handle.set_channel(16).is_err());
    }

    #[test]
    fn test_unconnected_trigger_is_ignored() {
        let handle = MidiOutputHandle::new().unwrap();
        assert!(!handle.is_connected());
        handle.trigger(
            &[PitchName::new("C4")],
            Duration::from_millis(10),
            Duration::ZERO,
        );
        assert!(handle.disconnect().is_ok());
    }

    #[test]
    fn test_list_ports() {
        // Port availability depends on the system
        match MidiOutputHandle::list_ports() {
            Ok(ports) => println!("{} MIDI ports", ports.len()),
            Err(e) => println!("MIDI unavailable: {}", e),
        }
    }
}
