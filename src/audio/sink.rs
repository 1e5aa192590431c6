//! Where triggered chords end up
//!
//! The transport and the preview path only know about [`TriggerSink`]; the
//! synth, the live MIDI port and the router that fans out between them all
//! implement it.

use anyhow::{anyhow, Result};
use codechord_core::types::PitchName;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Receiver of timed chord triggers
pub trait TriggerSink: Send + Sync {
    /// Sound `pitches` together after `delay`, each held for `duration`.
    /// Pitches without a usable mapping are skipped.
    fn trigger(&self, pitches: &[PitchName], duration: Duration, delay: Duration);

    /// Output level in decibels
    fn set_volume_db(&self, db: f32);

    /// Release everything currently sounding
    fn silence(&self) {}
}

/// Which sinks the router forwards to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Audio,
    Midi,
    Both,
}

impl OutputMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "audio" | "synth" => Some(OutputMode::Audio),
            "midi" => Some(OutputMode::Midi),
            "both" | "all" => Some(OutputMode::Both),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputMode::Audio => "audio",
            OutputMode::Midi => "midi",
            OutputMode::Both => "both",
        }
    }

    fn uses_audio(&self) -> bool {
        matches!(self, OutputMode::Audio | OutputMode::Both)
    }

    fn uses_midi(&self) -> bool {
        matches!(self, OutputMode::Midi | OutputMode::Both)
    }
}

/// Forwards triggers to the synth, the MIDI port, or both. Either side may be
/// missing when its device could not be opened.
pub struct SinkRouter {
    audio: Option<Arc<dyn TriggerSink>>,
    midi: Option<Arc<dyn TriggerSink>>,
    mode: RwLock<OutputMode>,
}

impl SinkRouter {
    pub fn new(audio: Option<Arc<dyn TriggerSink>>, midi: Option<Arc<dyn TriggerSink>>) -> Self {
        Self {
            audio,
            midi,
            mode: RwLock::new(OutputMode::default()),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode.read().map(|m| *m).unwrap_or_default()
    }

    /// Switch output mode. Fails if a required sink is unavailable.
    pub fn set_mode(&self, mode: OutputMode) -> Result<()> {
        if mode.uses_audio() && self.audio.is_none() {
            return Err(anyhow!("Audio output is not available"));
        }
        if mode.uses_midi() && self.midi.is_none() {
            return Err(anyhow!("MIDI output is not available"));
        }
        let mut current = self
            .mode
            .write()
            .map_err(|e| anyhow!("Failed to lock output mode: {}", e))?;
        *current = mode;
        Ok(())
    }

    fn active(&self) -> impl Iterator<Item = &Arc<dyn TriggerSink>> {
        let mode = self.mode();
        let audio = self.audio.iter().filter(move |_| mode.uses_audio());
        let midi = self.midi.iter().filter(move |_| mode.uses_midi());
        audio.chain(midi)
    }
}

impl TriggerSink for SinkRouter {
    fn trigger(&self, pitches: &[PitchName], duration: Duration, delay: Duration) {
        for sink in self.active() {
            sink.trigger(pitches, duration, delay);
        }
    }

    fn set_volume_db(&self, db: f32) {
        // Both sides track the level so switching modes keeps it
        for sink in self.audio.iter().chain(self.midi.iter()) {
            sink.set_volume_db(db);
        }
    }

    fn silence(&self) {
        for sink in self.audio.iter().chain(self.midi.iter()) {
            sink.silence();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counter {
        triggers: Mutex<usize>,
        volume: Mutex<Option<f32>>,
    }

    impl TriggerSink for Counter {
        fn trigger(&self, _pitches: &[PitchName], _duration: Duration, _delay: Duration) {
            *self.triggers.lock().unwrap() += 1;
        }

        fn set_volume_db(&self, db: f32) {
            *self.volume.lock().unwrap() = Some(db);
        }
    }

    fn count(sink: &Counter) -> usize {
        *sink.triggers.lock().unwrap()
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!(OutputMode::from_str("MIDI"), Some(OutputMode::Midi));
        assert_eq!(OutputMode::from_str("both"), Some(OutputMode::Both));
        assert_eq!(OutputMode::from_str("speaker"), None);
        assert_eq!(OutputMode::default(), OutputMode::Audio);
    }

    #[test]
    fn test_router_follows_mode() {
        let audio = Arc::new(Counter::default());
        let midi = Arc::new(Counter::default());
        let router = SinkRouter::new(Some(audio.clone()), Some(midi.clone()));
        let chord = [PitchName::new("C4")];

        router.trigger(&chord, Duration::from_millis(10), Duration::ZERO);
        assert_eq!((count(&audio), count(&midi)), (1, 0));

        router.set_mode(OutputMode::Both).unwrap();
        router.trigger(&chord, Duration::from_millis(10), Duration::ZERO);
        assert_eq!((count(&audio), count(&midi)), (2, 1));

        router.set_mode(OutputMode::Midi).unwrap();
        router.trigger(&chord, Duration::from_millis(10), Duration::ZERO);
        assert_eq!((count(&audio), count(&midi)), (2, 2));
    }

    #[test]
    fn test_router_rejects_missing_sink() {
        let router = SinkRouter::new(None, Some(Arc::new(Counter::default())));
        assert!(router.set_mode(OutputMode::Audio).is_err());
        assert!(router.set_mode(OutputMode::Midi).is_ok());
    }

    #[test]
    fn test_volume_reaches_every_sink() {
        let audio = Arc::new(Counter::default());
        let midi = Arc::new(Counter::default());
        let router = SinkRouter::new(Some(audio.clone()), Some(midi.clone()));
        router.set_volume_db(-12.0);
        assert_eq!(*audio.volume.lock().unwrap(), Some(-12.0));
        assert_eq!(*midi.volume.lock().unwrap(), Some(-12.0));
    }
}
