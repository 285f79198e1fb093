//! Phase-accumulator signal functions.
//!
//! Provides the fixed waveform set evaluated by oscillators, the phase
//! accumulator that drives them, a small deterministic noise generator, and
//! the load-time conversions applied to user-supplied sample tables.
//!
//! Phase is measured in cycles and always wrapped into [0, 1).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::f32::consts::TAU;
use libm::{fabsf, floorf, sinf};

/// Wrap a phase in cycles into [0, 1).
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - floorf(phase);
    // floorf can round a tiny negative up to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Oscillator waveform types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Square wave (50% duty cycle), ±1.
    Square,
    /// Triangle, starting at 0 and rising.
    Triangle,
    /// Rising ramp from -1 to 1.
    Sawtooth,
    /// Falling ramp from 1 to -1.
    ReverseSawtooth,
    /// White noise (phase is ignored).
    Noise,
}

impl Waveform {
    /// Evaluate the waveform at `phase` (cycles, any value; wrapped internally).
    #[inline]
    pub fn sample(self, phase: f32, noise: &mut NoiseGen) -> f32 {
        let x = wrap_phase(phase);
        match self {
            Waveform::Sine => sinf(x * TAU),
            Waveform::Square => {
                if x < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if x < 0.25 {
                    4.0 * x
                } else if x < 0.75 {
                    2.0 - 4.0 * x
                } else {
                    4.0 * x - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * x - 1.0,
            Waveform::ReverseSawtooth => 1.0 - 2.0 * x,
            Waveform::Noise => noise.next_bipolar(),
        }
    }
}

/// Phase accumulator in cycles.
///
/// ```rust
/// use modsynth_core::Phase;
///
/// let mut phase = Phase::default();
/// phase.advance(1.0, 4.0);
/// assert_eq!(phase.get(), 0.25);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Phase {
    value: f32,
}

impl Phase {
    /// Start at `phase` (wrapped into [0, 1)).
    pub fn new(phase: f32) -> Self {
        Self {
            value: wrap_phase(phase),
        }
    }

    /// Current phase in [0, 1).
    #[inline]
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Advance by `frequency / sample_rate` cycles. A zero sample rate holds.
    #[inline]
    pub fn advance(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        if sample_rate > 0.0 {
            self.value = wrap_phase(self.value + frequency / sample_rate);
        }
        self.value
    }
}

/// Xorshift32 pseudo-random generator.
///
/// Deterministic for a given seed so rendered patches are reproducible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseGen {
    state: u32,
}

impl NoiseGen {
    /// Seed the generator. A zero seed is replaced by a fixed non-zero one.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in [-1, 1].
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        (self.next_u32() as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Uniform index in `0..len`; returns 0 when `len` is 0.
    #[inline]
    pub fn next_below(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u32() as usize) % len
    }
}

impl Default for NoiseGen {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Scale a sample table into [-1, 1] by its peak magnitude.
///
/// All-zero (or empty) tables are returned unchanged. Non-finite samples are
/// replaced by zero.
///
/// ```rust
/// use modsynth_core::normalize;
///
/// assert_eq!(normalize(&[0.0, 2.0, -4.0]), vec![0.0, 0.5, -1.0]);
/// ```
pub fn normalize(table: &[f32]) -> Vec<f32> {
    let clean = |x: f32| if x.is_finite() { x } else { 0.0 };
    let peak = table.iter().map(|&x| fabsf(clean(x))).fold(0.0f32, f32::max);
    if peak == 0.0 {
        return table.iter().map(|&x| clean(x)).collect();
    }
    table.iter().map(|&x| clean(x) / peak).collect()
}

/// Coerce a clock table to ±1: positive samples become 1, everything else -1.
pub fn to_clock(table: &[f32]) -> Vec<f32> {
    table
        .iter()
        .map(|&x| if x > 0.0 { 1.0 } else { -1.0 })
        .collect()
}

/// Map text onto a sample table: each byte becomes `byte / 127.5 - 1`.
pub fn text_to_table(text: &str) -> Vec<f32> {
    text.bytes().map(|b| f32::from(b) / 127.5 - 1.0).collect()
}
