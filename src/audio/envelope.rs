//! Amplitude envelope for synth voices
//!
//! Exponential segments: each sample moves the level a fixed fraction of the
//! way toward the current target, so a segment reaches 99.9% of its target in
//! the configured time regardless of sample rate.

use codechord_core::types::AdsrParams;

/// ln(1000): segments converge to within 0.1% of their target
const CONVERGENCE: f32 = 6.9;
const SILENT: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// Per-sample smoothing factor for a segment lasting `seconds`
fn coefficient(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 {
        1.0
    } else {
        1.0 - (-CONVERGENCE / (seconds * sample_rate)).exp()
    }
}

/// Gate-driven ADSR. The gate opens on construction; [`Envelope::release`]
/// closes it.
#[derive(Debug, Clone)]
pub struct Envelope {
    sustain: f32,
    stage: Stage,
    level: f32,
    attack: f32,
    decay: f32,
    release: f32,
}

impl Envelope {
    pub fn new(params: AdsrParams, sample_rate: f32) -> Self {
        Self {
            sustain: params.sustain,
            stage: Stage::Attack,
            level: 0.0,
            attack: coefficient(params.attack, sample_rate),
            decay: coefficient(params.decay, sample_rate),
            release: coefficient(params.release, sample_rate),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Close the gate; the level falls from wherever it is
    pub fn release(&mut self) {
        if self.stage != Stage::Done {
            self.stage = Stage::Release;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Advance one sample and return the new level (0.0-1.0)
    pub fn next_level(&mut self) -> f32 {
        match self.stage {
            Stage::Attack => {
                self.level += (1.0 - self.level) * self.attack;
                if self.level >= 0.999 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level += (self.sustain - self.level) * self.decay;
                if (self.level - self.sustain).abs() < 0.001 {
                    self.level = self.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => self.level = self.sustain,
            Stage::Release => {
                self.level -= self.level * self.release;
                if self.level < SILENT {
                    self.level = 0.0;
                    self.stage = Stage::Done;
                }
            }
            Stage::Done => self.level = 0.0,
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn run(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_level();
        }
    }

    #[test]
    fn test_attack_rises_to_decay() {
        let mut env = Envelope::new(AdsrParams::new(0.01, 0.1, 0.7, 0.2), SAMPLE_RATE);
        assert_eq!(env.stage(), Stage::Attack);
        run(&mut env, 100);
        assert!(env.level() > 0.0);
        run(&mut env, 1000);
        assert!(matches!(env.stage(), Stage::Decay | Stage::Sustain));
    }

    #[test]
    fn test_settles_on_sustain() {
        let mut env = Envelope::new(AdsrParams::new(0.001, 0.01, 0.6, 0.1), SAMPLE_RATE);
        run(&mut env, 5000);
        assert_eq!(env.stage(), Stage::Sustain);
        assert!((env.level() - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_release_reaches_silence() {
        let mut env = Envelope::new(AdsrParams::new(0.001, 0.01, 0.5, 0.01), SAMPLE_RATE);
        run(&mut env, 2000);
        env.release();
        assert_eq!(env.stage(), Stage::Release);
        run(&mut env, 5000);
        assert!(env.is_finished());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_release_during_attack_is_continuous() {
        let mut env = Envelope::new(AdsrParams::new(0.1, 0.1, 0.7, 0.1), SAMPLE_RATE);
        run(&mut env, 10);
        let before = env.level();
        env.release();
        assert!((env.level() - before).abs() < f32::EPSILON);
    }

    #[test]
    fn test_output_stays_in_range() {
        let mut env = Envelope::new(AdsrParams::pad(), SAMPLE_RATE);
        for i in 0..20000 {
            if i == 10000 {
                env.release();
            }
            let level = env.next_level();
            assert!((0.0..=1.0).contains(&level), "level {} out of range", level);
        }
    }
}
