//! One sounding pitch in the synth
//!
//! A voice waits out its start delay, holds its gate for the note duration,
//! then rings out through the envelope release.

use super::envelope::Envelope;
use codechord_core::types::{AdsrParams, Waveform};
use std::f32::consts::PI;

pub struct Voice {
    frequency: f32,
    phase: f32,
    sample_rate: f32,
    waveform: Waveform,
    envelope: Envelope,
    /// Samples left before the voice starts
    delay: u64,
    /// Samples left before the gate closes
    gate: u64,
}

impl Voice {
    pub fn new(
        frequency: f32,
        sample_rate: f32,
        waveform: Waveform,
        envelope: AdsrParams,
        delay_secs: f32,
        duration_secs: f32,
    ) -> Self {
        Self {
            frequency,
            phase: 0.0,
            sample_rate,
            waveform,
            envelope: Envelope::new(envelope, sample_rate),
            delay: (delay_secs.max(0.0) * sample_rate) as u64,
            gate: (duration_secs.max(0.0) * sample_rate).max(1.0) as u64,
        }
    }

    /// Cut the note short; the envelope release still runs
    pub fn release(&mut self) {
        self.delay = 0;
        self.gate = 0;
        self.envelope.release();
    }

    pub fn is_pending(&self) -> bool {
        self.delay > 0
    }

    pub fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.delay > 0 {
            self.delay -= 1;
            return 0.0;
        }

        if self.gate > 0 {
            self.gate -= 1;
            if self.gate == 0 {
                self.envelope.release();
            }
        }

        let value = wave(self.waveform, self.phase);
        self.phase = (self.phase + self.frequency / self.sample_rate).fract();
        value * self.envelope.next_level()
    }
}

/// Raw waveform value at `phase` (0.0 to 1.0)
fn wave(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (2.0 * PI * phase).sin(),
        Waveform::Saw => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_waveforms_in_range() {
        for waveform in Waveform::ALL {
            let mut voice = Voice::new(440.0, SAMPLE_RATE, waveform, AdsrParams::default(), 0.0, 0.1);
            for _ in 0..2000 {
                let sample = voice.next_sample();
                assert!((-1.0..=1.0).contains(&sample), "{:?}: {}", waveform, sample);
            }
        }
    }

    #[test]
    fn test_delay_is_silent() {
        let mut voice = Voice::new(440.0, SAMPLE_RATE, Waveform::Square, AdsrParams::organ(), 0.01, 0.1);
        let mut silent = 0;
        while voice.is_pending() {
            assert_eq!(voice.next_sample(), 0.0);
            silent += 1;
        }
        assert!((440..=441).contains(&silent), "{} silent samples", silent);
    }

    #[test]
    fn test_voice_finishes_after_gate() {
        let mut voice = Voice::new(220.0, SAMPLE_RATE, Waveform::Sine, AdsrParams::perc(), 0.0, 0.05);
        for _ in 0..(SAMPLE_RATE as usize) {
            voice.next_sample();
        }
        assert!(voice.is_finished());
    }

    #[test]
    fn test_release_cuts_pending_voice() {
        let mut voice = Voice::new(220.0, SAMPLE_RATE, Waveform::Sine, AdsrParams::default(), 1.0, 1.0);
        voice.release();
        assert!(!voice.is_pending());
        for _ in 0..(SAMPLE_RATE as usize) {
            voice.next_sample();
        }
        assert!(voice.is_finished());
    }
}
