//! Rational beat positions
//!
//! Style offsets and durations are exact fractions of a beat (quarters,
//! fifths, tenths). Keeping them rational means slot arithmetic never drifts
//! and span checks compare exactly; conversion to seconds or ticks happens only
//! at the edge.

use num_rational::Ratio;

/// Exact time point or span in beats
pub type Time = Ratio<i64>;

/// Helper to create Time from a ratio n/d
#[inline]
pub fn time(n: i64, d: i64) -> Time {
    Ratio::new(n, d)
}

/// Create Time from an integer (whole beats)
#[inline]
pub fn beats(n: i64) -> Time {
    Ratio::from_integer(n)
}

/// Convert rational to f64 for scheduling
#[inline]
pub fn to_f64(t: Time) -> f64 {
    *t.numer() as f64 / *t.denom() as f64
}

/// Convert a beat span to seconds at the given tempo
#[inline]
pub fn beats_to_seconds(t: Time, bpm: f64) -> f64 {
    to_f64(t) * 60.0 / bpm
}

/// Convert a beat position to MIDI ticks, rounding to the nearest tick
pub fn to_ticks(t: Time, ticks_per_beat: u16) -> u32 {
    let scaled = t * Ratio::from_integer(ticks_per_beat as i64);
    scaled.round().to_integer().max(0) as u32
}
