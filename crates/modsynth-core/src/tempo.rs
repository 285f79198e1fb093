//! Tempo conversions for clocked modules.

/// Samples per beat at `bpm`.
///
/// A non-positive or non-finite `bpm` yields `f32::INFINITY`, so a clock
/// advanced by `1 / samples_per_beat` stands still instead of dividing by zero.
///
/// # Example
///
/// ```rust
/// use modsynth_core::samples_per_beat;
///
/// assert_eq!(samples_per_beat(44100.0, 60.0), 44100.0);
/// assert_eq!(samples_per_beat(44100.0, 120.0), 22050.0);
/// assert_eq!(samples_per_beat(44100.0, 0.0), f32::INFINITY);
/// ```
#[inline]
pub fn samples_per_beat(sample_rate: f32, bpm: f32) -> f32 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return f32::INFINITY;
    }
    sample_rate * 60.0 / bpm
}

/// Beats advanced per sample at `bpm`; zero when the clock is stopped.
#[inline]
pub fn beats_per_sample(sample_rate: f32, bpm: f32) -> f32 {
    let spb = samples_per_beat(sample_rate, bpm);
    if spb.is_finite() && spb > 0.0 {
        1.0 / spb
    } else {
        0.0
    }
}
