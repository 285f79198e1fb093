//! Domain ranges for modulatable values.
//!
//! Every modulatable parameter resolves into a fixed interval. Out-of-range
//! modulation is silently clamped, never reported.
//!
//! A [`Range`] also defines the control-voltage mapping used when one module
//! drives another module's value through its mono output (e.g. a sequencer
//! driving an oscillator's frequency): the range is mapped linearly onto
//! [-1, 1].

/// Closed interval `[min, max]` a value is clamped into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    /// Lower bound (inclusive).
    pub min: f32,
    /// Upper bound (inclusive).
    pub max: f32,
}

impl Range {
    /// Create a range. `min` must not exceed `max`.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. NaN resolves to `min`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Width of the interval.
    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Map a value in this range onto control voltage [-1, 1].
    ///
    /// ```rust
    /// use modsynth_core::range::FREQUENCY;
    ///
    /// assert_eq!(FREQUENCY.to_cv(0.0), -1.0);
    /// assert_eq!(FREQUENCY.to_cv(20000.0), 1.0);
    /// ```
    #[inline]
    pub fn to_cv(&self, value: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        (self.clamp(value) - self.min) / span * 2.0 - 1.0
    }

    /// Map control voltage [-1, 1] back into this range.
    ///
    /// Inverse of [`to_cv`](Self::to_cv); `cv` is clamped to [-1, 1] first.
    #[inline]
    pub fn from_cv(&self, cv: f32) -> f32 {
        let cv = if cv.is_nan() { -1.0 } else { cv.clamp(-1.0, 1.0) };
        self.min + (cv + 1.0) / 2.0 * self.span()
    }
}

/// Amplitudes and mixer input weights.
pub const AMPLITUDE: Range = Range::new(0.0, 1.0);
/// Signed output gain.
pub const GAIN: Range = Range::new(-1.0, 1.0);
/// Stereo position.
pub const PAN: Range = Range::new(-1.0, 1.0);
/// Dry/wet mix.
pub const MIX: Range = Range::new(0.0, 1.0);
/// Frequencies in Hz.
pub const FREQUENCY: Range = Range::new(0.0, 20000.0);
/// Tempo in beats per minute.
pub const BPM: Range = Range::new(0.0, 2000.0);
/// Durations in seconds (envelope stages, delay time).
pub const TIME: Range = Range::new(0.0, 3600.0);
/// Trigger thresholds.
pub const THRESHOLD: Range = Range::new(0.0, 1.0);
/// Phase offsets in cycles.
pub const PHASE: Range = Range::new(-1.0, 1.0);
/// Transposition in semitones.
pub const TRANSPOSE: Range = Range::new(-48.0, 48.0);
/// Reference pitch in Hz.
pub const PITCH: Range = Range::new(1.0, 20000.0);
/// Modulation amounts.
pub const MODULATION: Range = Range::new(-20000.0, 20000.0);
