//! Per-sample stereo output triple.
//!
//! Every module produces one [`Output`] per sample: a mono value plus the
//! left/right pair it pans to. Values are nominally within [-1, 1] but are
//! never hard-clamped here, so overdrive stays observable downstream.

use core::ops::{Add, AddAssign};

/// One sample of module output: mono plus its stereo image.
///
/// # Example
///
/// ```rust
/// use modsynth_core::Output;
///
/// // Centered: both channels carry half the mono value
/// let out = Output::panned(1.0, 0.0);
/// assert_eq!(out.left, 0.5);
/// assert_eq!(out.right, 0.5);
///
/// // Hard right
/// let out = Output::panned(1.0, 1.0);
/// assert_eq!(out.left, 0.0);
/// assert_eq!(out.right, 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Output {
    /// Mono value (the value read by modulation consumers).
    pub mono: f32,
    /// Left channel.
    pub left: f32,
    /// Right channel.
    pub right: f32,
}

impl Output {
    /// All channels at zero.
    pub const SILENT: Output = Output {
        mono: 0.0,
        left: 0.0,
        right: 0.0,
    };

    /// Construct from explicit channel values.
    #[inline]
    pub const fn new(mono: f32, left: f32, right: f32) -> Self {
        Self { mono, left, right }
    }

    /// Pan a mono value into stereo.
    ///
    /// `pan` is clamped to [-1, 1] and mapped to `p = (pan + 1) / 2`;
    /// `left = mono * (1 - p)`, `right = mono * p`.
    #[inline]
    pub fn panned(mono: f32, pan: f32) -> Self {
        let p = (pan.clamp(-1.0, 1.0) + 1.0) / 2.0;
        Self {
            mono,
            left: mono * (1.0 - p),
            right: mono * p,
        }
    }

    /// Multiply every channel by `gain`.
    #[inline]
    pub fn scaled(self, gain: f32) -> Self {
        Self {
            mono: self.mono * gain,
            left: self.left * gain,
            right: self.right * gain,
        }
    }

    /// Average of the two stereo channels.
    #[inline]
    pub fn mean(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// True if every channel is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.mono.is_finite() && self.left.is_finite() && self.right.is_finite()
    }
}

impl Add for Output {
    type Output = Output;

    #[inline]
    fn add(self, rhs: Output) -> Output {
        Output {
            mono: self.mono + rhs.mono,
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl AddAssign for Output {
    #[inline]
    fn add_assign(&mut self, rhs: Output) {
        self.mono += rhs.mono;
        self.left += rhs.left;
        self.right += rhs.right;
    }
}
