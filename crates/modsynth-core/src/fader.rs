//! Linear ramp smoothing for values that must move continuously.
//!
//! A [`Fader`] moves from its current value to a target at a constant rate,
//! so a value changed between patch versions (or the master volume during a
//! start/stop) glides instead of stepping.
//!
//! ## Usage
//!
//! ```rust
//! use modsynth_core::Fader;
//!
//! let mut volume = Fader::new(0.0);
//! volume.fade_to(1.0, 0.01, 48000.0); // 10ms ramp
//!
//! for _ in 0..480 {
//!     let gain = volume.advance();
//!     // apply gain...
//! }
//! assert!(volume.is_settled());
//! assert_eq!(volume.get(), 1.0);
//! ```

use libm::ceilf;

/// A value ramping linearly toward a target.
///
/// `step` is `(target - current) / (seconds * sample_rate)`. When either the
/// duration or the sample rate is zero the whole distance is covered in a
/// single call. The fader never overshoots: it snaps to the target the
/// instant the remaining distance would change sign, and after exactly
/// `ceil(seconds * sample_rate)` calls at the latest.
#[derive(Debug, Clone, PartialEq)]
pub struct Fader {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Increment per sample (can be positive or negative)
    step: f32,
    /// Calls left until the target is reached
    remaining: u32,
}

impl Fader {
    /// Create a fader settled at `value`.
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Start a ramp from the current value to `target`.
    ///
    /// # Arguments
    /// * `target` - Value to reach
    /// * `seconds` - Ramp duration; zero or negative jumps in one call
    /// * `sample_rate` - Calls per second; zero or negative jumps in one call
    pub fn fade_to(&mut self, target: f32, seconds: f32, sample_rate: f32) {
        self.target = target;
        let distance = target - self.current;

        if distance == 0.0 {
            self.step = 0.0;
            self.remaining = 0;
            return;
        }

        let samples = seconds * sample_rate;
        if !samples.is_finite() || samples <= 0.0 {
            self.step = distance;
            self.remaining = 1;
        } else {
            self.step = distance / samples;
            self.remaining = (ceilf(samples) as u32).max(1);
        }
    }

    /// Set value immediately, cancelling any ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value.
    ///
    /// Idempotent once the target has been reached.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.remaining == 0 {
            return self.current;
        }

        let next = self.current + self.step;
        self.remaining -= 1;

        let before = self.target - self.current;
        let after = self.target - next;
        if self.remaining == 0 || after == 0.0 || before.signum() != after.signum() {
            self.snap_to_target();
        } else {
            self.current = next;
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Per-sample increment of the active ramp.
    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// True once `current == target`.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }

    /// Jump to the target immediately.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.step = 0.0;
        self.remaining = 0;
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(0.0)
    }
}
