//! Resizable feedback comb filter.
//!
//! A circular buffer whose output is mixed with the input and written back,
//! giving repeating echoes that decay with the mix amount. Used by the delay
//! module.
//!
//! ```text
//! y = x * (1 - mix) + buffer[idx] * mix
//! buffer[idx] = y
//! idx = (idx + 1) mod len
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use libm::ceilf;

/// Number of samples needed to hold `seconds` of audio at `sample_rate`.
///
/// Negative or non-finite products yield 0.
#[inline]
pub fn delay_samples(seconds: f32, sample_rate: f32) -> usize {
    let samples = seconds * sample_rate;
    if samples.is_finite() && samples > 0.0 {
        ceilf(samples) as usize
    } else {
        0
    }
}

/// Feedback comb filter over a resizable circular buffer.
///
/// # Example
///
/// ```rust
/// use modsynth_core::Comb;
///
/// let mut comb = Comb::default();
/// comb.initialize(1.0, 400.0);
/// assert_eq!(comb.len(), 400);
///
/// let first = comb.step(1.0, 0.5);
/// assert_eq!(first, 0.5); // half dry, half of an empty buffer
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comb {
    buffer: Vec<f32>,
    idx: usize,
}

impl Comb {
    /// Create a zeroed comb of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            idx: 0,
        }
    }

    /// Replace the buffer with `ceil(seconds * sample_rate)` zeros.
    pub fn initialize(&mut self, seconds: f32, sample_rate: f32) {
        self.buffer = vec![0.0; delay_samples(seconds, sample_rate)];
        self.idx = 0;
    }

    /// Resize the buffer, preserving content.
    ///
    /// Growing appends zeros at the tail and keeps the read index; shrinking
    /// truncates the tail and clamps the index into the new bounds.
    pub fn resize(&mut self, len: usize) {
        let previous = self.buffer.len();
        if len == previous {
            return;
        }
        self.buffer.resize(len, 0.0);
        self.idx = self.idx.min(len.saturating_sub(1));

        #[cfg(feature = "tracing")]
        tracing::debug!(from = previous, to = len, "comb resized");
        #[cfg(not(feature = "tracing"))]
        let _ = previous;
    }

    /// Process one sample.
    ///
    /// An empty buffer passes the input through unchanged.
    #[inline]
    pub fn step(&mut self, input: f32, mix: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return input;
        }
        let output = input * (1.0 - mix) + self.buffer[self.idx] * mix;
        self.buffer[self.idx] = output;
        self.idx = (self.idx + 1) % len;
        output
    }

    /// Buffer length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if the buffer holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current read/write index.
    #[inline]
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Buffer contents, oldest write position first at `index()`.
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Zero the buffer without changing its size.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.idx = 0;
    }
}
