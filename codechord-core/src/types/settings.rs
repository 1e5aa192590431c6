//! Playback settings shared by the synth, the transport and the exporter
//!
//! Plain data only; nothing here touches an audio device, so the core crate
//! stays usable without one.

/// Default tempo in beats per minute
pub const DEFAULT_BPM: u32 = 100;
/// Tempo range accepted by the REPL
pub const MIN_BPM: u32 = 1;
pub const MAX_BPM: u32 = 400;

/// Default output level in decibels
pub const DEFAULT_VOLUME_DB: f32 = -6.0;
pub const MIN_VOLUME_DB: f32 = -24.0;
pub const MAX_VOLUME_DB: f32 = 0.0;

/// Available waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Triangle,
    ];

    /// Parse waveform from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Waveform> {
        match s.to_lowercase().as_str() {
            "sine" | "sin" => Some(Waveform::Sine),
            "saw" | "sawtooth" => Some(Waveform::Saw),
            "square" | "sq" => Some(Waveform::Square),
            "triangle" | "tri" => Some(Waveform::Triangle),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
        }
    }
}

/// ADSR envelope parameters
///
/// - `attack`: seconds from 0 to peak
/// - `decay`: seconds from peak to the sustain level
/// - `sustain`: level held while the note is on (0.0-1.0, not a time)
/// - `release`: seconds from sustain to 0 after note-off
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub const PRESETS: [&'static str; 5] = ["default", "pluck", "pad", "perc", "organ"];

    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.001), // Minimum 1ms to avoid clicks
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.001),
        }
    }

    /// Smooth general-purpose envelope
    pub fn default_envelope() -> Self {
        Self::new(0.01, 0.1, 0.7, 0.2)
    }

    /// Fast attack, quick decay, no sustain
    pub fn pluck() -> Self {
        Self::new(0.001, 0.15, 0.0, 0.1)
    }

    /// Slow attack and release, high sustain
    pub fn pad() -> Self {
        Self::new(0.3, 0.2, 0.8, 0.5)
    }

    pub fn perc() -> Self {
        Self::new(0.001, 0.2, 0.0, 0.05)
    }

    pub fn organ() -> Self {
        Self::new(0.005, 0.0, 1.0, 0.01)
    }

    /// Look up a preset by name (case-insensitive)
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default_envelope()),
            "pluck" => Some(Self::pluck()),
            "pad" => Some(Self::pad()),
            "perc" | "percussion" => Some(Self::perc()),
            "organ" => Some(Self::organ()),
            _ => None,
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::default_envelope()
    }
}

/// Tempo, level and voice used for playback and export
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackSettings {
    bpm: u32,
    volume_db: f32,
    pub waveform: Waveform,
    pub envelope: AdsrParams,
}

impl PlaybackSettings {
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    /// Set the tempo, clamped to the accepted range
    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    /// Set the output level, clamped to -24..=0 dB
    pub fn set_volume_db(&mut self, db: f32) {
        self.volume_db = if db.is_nan() {
            DEFAULT_VOLUME_DB
        } else {
            db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB)
        };
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            volume_db: DEFAULT_VOLUME_DB,
            waveform: Waveform::default(),
            envelope: AdsrParams::default(),
        }
    }
}

/// Convert decibels to a linear gain factor
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_names() {
        for waveform in Waveform::ALL {
            assert_eq!(Waveform::from_str(waveform.name()), Some(waveform));
        }
        assert_eq!(Waveform::from_str("Sawtooth"), Some(Waveform::Saw));
        assert_eq!(Waveform::from_str("noise"), None);
    }

    #[test]
    fn test_envelope_floor() {
        let env = AdsrParams::new(0.0, -2.0, 4.0, 0.0);
        assert_eq!(env.attack, 0.001);
        assert_eq!(env.decay, 0.0);
        assert_eq!(env.sustain, 1.0);
        assert!(env.release > 0.0);
    }

    #[test]
    fn test_presets_by_name() {
        for name in AdsrParams::PRESETS {
            assert!(AdsrParams::from_preset(name).is_some(), "{}", name);
        }
        assert_eq!(AdsrParams::from_preset("PAD"), Some(AdsrParams::pad()));
        assert_eq!(AdsrParams::from_preset("bell"), None);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = PlaybackSettings::default();
        assert_eq!(settings.bpm(), 100);
        assert_eq!(settings.volume_db(), -6.0);
        assert_eq!(settings.waveform, Waveform::Sine);
    }

    #[test]
    fn test_settings_clamp() {
        let mut settings = PlaybackSettings::default();
        settings.set_volume_db(-40.0);
        assert_eq!(settings.volume_db(), -24.0);
        settings.set_volume_db(3.0);
        assert_eq!(settings.volume_db(), 0.0);
        settings.set_bpm(0);
        assert_eq!(settings.bpm(), MIN_BPM);
        settings.set_bpm(1000);
        assert_eq!(settings.bpm(), MAX_BPM);
    }

    #[test]
    fn test_db_to_gain() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0) - 0.501).abs() < 1e-3);
    }
}
