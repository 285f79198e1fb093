//! Modulatable parameters and their per-sample resolution.
//!
//! A [`Param`] is a base value plus a list of named modulation sources and
//! a modulation amount. Each sample it resolves to
//!
//! ```text
//! clamp(base + amount * Σ mono(source), range)
//! ```
//!
//! Source names are resolved to slot indices once, when the graph is linked
//! ([`Param::link`]). Names that do not exist in the graph are dropped and
//! contribute zero; a missing modulator is never an error.
//!
//! The base value lives in a [`Fader`], so a hot-swap that changes a declared
//! value can glide to the new value instead of stepping.
//!
//! ## Usage
//!
//! ```rust
//! use modsynth_core::{Output, Param, Signals, range};
//!
//! let mut cutoff = Param::new(1000.0, range::FREQUENCY).with_modulation(["lfo"], 200.0);
//! cutoff.link(|name| (name == "lfo").then_some(0));
//!
//! let mut signals = Signals::with_len(1);
//! signals.record(0, Output::panned(0.5, 0.0), None, 48000.0);
//!
//! assert_eq!(cutoff.resolve(&signals), 1100.0);
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::{Fader, Range, Signals};

/// A modulatable scalar with a domain range.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Declared base value (glides on hot-swap)
    base: Fader,
    /// Declared modulation source names
    sources: Vec<String>,
    /// Slot indices of the sources that exist in the graph
    links: Vec<usize>,
    /// Modulation depth
    amount: f32,
    /// Clamp interval for the resolved value
    range: Range,
}

impl Param {
    /// Create an unmodulated parameter.
    pub fn new(value: f32, range: Range) -> Self {
        Self {
            base: Fader::new(value),
            sources: Vec::new(),
            links: Vec::new(),
            amount: 0.0,
            range,
        }
    }

    /// Attach modulation sources and depth.
    pub fn with_modulation<I, S>(mut self, sources: I, amount: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_modulation(sources, amount);
        self
    }

    /// Replace modulation sources and depth. Call [`link`](Self::link) afterwards.
    pub fn set_modulation<I, S>(&mut self, sources: I, amount: f32)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self.links.clear();
        self.amount = amount;
    }

    /// Resolve source names to slot indices; unknown names are dropped.
    pub fn link(&mut self, lookup: impl Fn(&str) -> Option<usize>) {
        self.links = self.sources.iter().filter_map(|name| lookup(name.as_str())).collect();
    }

    /// Retarget the base value, gliding over `glide_seconds`.
    pub fn retarget(&mut self, value: f32, glide_seconds: f32, sample_rate: f32) {
        if value != self.base.target() {
            self.base.fade_to(value, glide_seconds, sample_rate);
        }
    }

    /// Adopt the configuration of a freshly built parameter.
    ///
    /// The base glides to `fresh`'s declared value; sources, links, depth, and
    /// range are moved out of `fresh` (leaving its lists empty) so no
    /// allocation happens here.
    pub fn update(&mut self, fresh: &mut Param, glide_seconds: f32, sample_rate: f32) {
        self.retarget(fresh.target(), glide_seconds, sample_rate);
        core::mem::swap(&mut self.sources, &mut fresh.sources);
        core::mem::swap(&mut self.links, &mut fresh.links);
        self.amount = fresh.amount;
        self.range = fresh.range;
    }

    /// Advance the base fader by one sample and resolve.
    #[inline]
    pub fn next(&mut self, signals: &Signals) -> f32 {
        self.base.advance();
        self.resolve(signals)
    }

    /// Advance the base fader by one sample without resolving.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.base.advance()
    }

    /// Resolve against the current snapshot: base plus output modulation, clamped.
    #[inline]
    pub fn resolve(&self, signals: &Signals) -> f32 {
        self.resolve_from(self.base.get(), signals)
    }

    /// Resolve with an explicit base value (e.g. one derived from a CV input).
    #[inline]
    pub fn resolve_from(&self, base: f32, signals: &Signals) -> f32 {
        self.range.clamp(base + self.amount * self.modulation(signals))
    }

    /// Sum of the linked sources' mono outputs.
    #[inline]
    pub fn modulation(&self, signals: &Signals) -> f32 {
        self.links.iter().map(|&i| signals.output(i).mono).sum()
    }

    /// Modulation depth times the sum of the linked sources' running integrals.
    ///
    /// Used for phase-continuous frequency modulation of table playback.
    #[inline]
    pub fn integral_offset(&self, signals: &Signals) -> f64 {
        f64::from(self.amount) * self.links.iter().map(|&i| signals.integral(i)).sum::<f64>()
    }

    /// Current (possibly gliding) base value.
    #[inline]
    pub fn base(&self) -> f32 {
        self.base.get()
    }

    /// Declared base value the fader is heading to.
    #[inline]
    pub fn target(&self) -> f32 {
        self.base.target()
    }

    /// Declared source names.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Slot indices the sources resolved to.
    pub fn links(&self) -> &[usize] {
        &self.links
    }

    /// Modulation depth.
    #[inline]
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Clamp interval.
    #[inline]
    pub fn range(&self) -> Range {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Output;
    use crate::range::{AMPLITUDE, FREQUENCY};

    fn signals_with(monos: &[f32]) -> Signals {
        let mut signals = Signals::with_len(monos.len());
        for (i, &mono) in monos.iter().enumerate() {
            signals.record(i, Output::panned(mono, 0.0), None, 48000.0);
        }
        signals
    }

    #[test]
    fn unmodulated_resolves_to_base() {
        let param = Param::new(0.25, AMPLITUDE);
        assert_eq!(param.resolve(&Signals::default()), 0.25);
    }

    #[test]
    fn sums_all_sources() {
        let mut param = Param::new(100.0, FREQUENCY).with_modulation(["a", "b"], 10.0);
        param.link(|name| match name {
            "a" => Some(0),
            "b" => Some(1),
            _ => None,
        });
        let signals = signals_with(&[0.5, -0.2]);
        assert!((param.resolve(&signals) - 103.0).abs() < 1e-4);
    }

    #[test]
    fn unknown_sources_contribute_zero() {
        let mut param = Param::new(0.5, AMPLITUDE).with_modulation(["ghost"], 1.0);
        param.link(|_| None);
        assert!(param.links().is_empty());
        assert_eq!(param.resolve(&signals_with(&[1.0])), 0.5);
    }

    #[test]
    fn resolved_value_is_clamped() {
        let mut param = Param::new(0.9, AMPLITUDE).with_modulation(["m"], 1.0);
        param.link(|_| Some(0));
        assert_eq!(param.resolve(&signals_with(&[1.0])), 1.0);
        assert_eq!(param.resolve(&signals_with(&[-1.0])), 0.0);
    }

    #[test]
    fn self_reference_reads_previous_value() {
        let mut param = Param::new(0.0, AMPLITUDE).with_modulation(["me"], 0.5);
        param.link(|_| Some(0));
        let mut signals = Signals::with_len(1);
        let first = param.next(&signals);
        signals.record(0, Output::panned(1.0, 0.0), None, 48000.0);
        let second = param.next(&signals);
        assert_eq!(first, 0.0);
        assert_eq!(second, 0.5);
    }

    #[test]
    fn retarget_glides() {
        let mut param = Param::new(0.0, AMPLITUDE);
        param.retarget(1.0, 1.0, 4.0);
        let signals = Signals::default();
        let values: Vec<f32> = (0..4).map(|_| param.next(&signals)).collect();
        assert_eq!(values, [0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn update_takes_fresh_configuration() {
        let mut live = Param::new(0.2, AMPLITUDE).with_modulation(["old"], 1.0);
        live.link(|_| Some(3));
        let mut fresh = Param::new(0.6, AMPLITUDE).with_modulation(["new"], 0.5);
        fresh.link(|_| Some(1));

        live.update(&mut fresh, 0.0, 48000.0);
        assert_eq!(live.sources(), ["new".to_string()]);
        assert_eq!(live.links(), [1]);
        assert_eq!(live.amount(), 0.5);
        assert_eq!(live.base(), 0.2);
        assert_eq!(live.advance(), 0.6);
    }

    #[test]
    fn integral_offset_scales_by_amount() {
        let mut param = Param::new(2.0, FREQUENCY).with_modulation(["fm"], 3.0);
        param.link(|_| Some(0));
        let mut signals = Signals::with_len(1);
        signals.record(0, Output::new(1.0, 0.5, 0.5), None, 1.0);
        signals.record(0, Output::new(1.0, 0.5, 0.5), None, 1.0);
        assert_eq!(param.integral_offset(&signals), 3.0);
    }
}
