//! Per-pass snapshot of every module's latest output.
//!
//! The graph evaluates modules one after another and records each result
//! here immediately. A module reading another module through [`Signals`]
//! therefore sees the current pass's value for modules evaluated before it
//! and the previous pass's value for modules evaluated after it (including
//! itself). This single-sample delay makes cyclic modulation well-defined
//! without any topological sort.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::{BandCurve, Output};

/// Latest output, running integral, and band curve of every slot.
///
/// Indices are the graph's slot indices. Reads outside the snapshot resolve
/// to silence, so a stale index can never fault the audio path.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    outputs: Vec<Output>,
    integrals: Vec<f64>,
    curves: Vec<Option<BandCurve>>,
}

impl Signals {
    /// Create a silent snapshot for `len` slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            outputs: vec![Output::SILENT; len],
            integrals: vec![0.0; len],
            curves: vec![None; len],
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// True if there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Latest output of slot `index`.
    #[inline]
    pub fn output(&self, index: usize) -> Output {
        self.outputs.get(index).copied().unwrap_or(Output::SILENT)
    }

    /// Running time-integral of slot `index`.
    ///
    /// Accumulated in `f64`; an `f32` sum stops moving once the per-sample
    /// step falls below half an ulp of the total.
    #[inline]
    pub fn integral(&self, index: usize) -> f64 {
        self.integrals.get(index).copied().unwrap_or(0.0)
    }

    /// Band curve published by slot `index`, if it is a filter.
    #[inline]
    pub fn curve(&self, index: usize) -> Option<BandCurve> {
        self.curves.get(index).copied().flatten()
    }

    /// Record a freshly computed output and accumulate its integral.
    ///
    /// The integral grows by the stereo mean of `output` divided by the
    /// sample rate; a zero sample rate leaves it unchanged.
    #[inline]
    pub fn record(
        &mut self,
        index: usize,
        output: Output,
        curve: Option<BandCurve>,
        sample_rate: f32,
    ) {
        if index >= self.outputs.len() {
            return;
        }
        self.outputs[index] = output;
        self.curves[index] = curve;
        if sample_rate > 0.0 {
            self.integrals[index] += f64::from(output.mean()) / f64::from(sample_rate);
        }
    }

    /// Overwrite a slot's full state (used when carrying state across a hot-swap).
    pub fn restore(&mut self, index: usize, output: Output, integral: f64, curve: Option<BandCurve>) {
        if index >= self.outputs.len() {
            return;
        }
        self.outputs[index] = output;
        self.integrals[index] = integral;
        self.curves[index] = curve;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_are_silent() {
        let signals = Signals::with_len(2);
        assert_eq!(signals.output(9), Output::SILENT);
        assert_eq!(signals.integral(9), 0.0);
        assert!(signals.curve(9).is_none());
    }

    #[test]
    fn record_accumulates_integral() {
        let mut signals = Signals::with_len(1);
        let out = Output::new(1.0, 0.5, 0.5);
        for _ in 0..4 {
            signals.record(0, out, None, 1.0);
        }
        assert_eq!(signals.output(0), out);
        assert_eq!(signals.integral(0), 2.0);
    }

    #[test]
    fn integral_keeps_growing_over_long_runs() {
        let mut signals = Signals::with_len(1);
        let out = Output::new(1.0, 0.5, 0.5);
        // Ten minutes at 48 kHz.
        for _ in 0..48000 * 600 {
            signals.record(0, out, None, 48000.0);
        }
        assert!((signals.integral(0) - 300.0).abs() < 1e-4);
    }

    #[test]
    fn record_ignores_zero_sample_rate_integral() {
        let mut signals = Signals::with_len(1);
        signals.record(0, Output::new(1.0, 1.0, 1.0), None, 0.0);
        assert_eq!(signals.integral(0), 0.0);
    }
}
