//! Band-pass frequency mask.
//!
//! A filter produces no audio of its own. Each sample it resolves its edges
//! and publishes a [`BandCurve`] that oscillators naming it in `filters`
//! apply to each partial's frequency.

use modsynth_config::FilterDef;
use modsynth_core::range::{AMPLITUDE, FREQUENCY};
use modsynth_core::{BandCurve, Output, Param};

use super::{BuildContext, Glide, Lookup, StepContext};

/// Band-pass curve publisher.
#[derive(Debug, Clone)]
pub struct Filter {
    low: Param,
    high: Param,
    ramp: Param,
    volume: Param,
    curve: BandCurve,
}

impl Filter {
    /// Build from a declaration.
    pub fn from_def(def: &FilterDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            low: def.low.to_param(FREQUENCY),
            high: def.high.to_param(FREQUENCY),
            ramp: def.ramp.to_param(FREQUENCY),
            volume: def.volume.to_param(AMPLITUDE),
            curve: BandCurve::new(def.low.val, def.high.val, def.ramp.val, def.volume.val),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.low.link(lookup);
        self.high.link(lookup);
        self.ramp.link(lookup);
        self.volume.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        self.curve = BandCurve::new(
            self.low.next(signals),
            self.high.next(signals),
            self.ramp.next(signals),
            self.volume.next(signals),
        );
        Output::SILENT
    }

    pub(crate) fn update(&mut self, fresh: &mut Filter, glide: Glide) {
        glide.param(&mut self.low, &mut fresh.low);
        glide.param(&mut self.high, &mut fresh.high);
        glide.param(&mut self.ramp, &mut fresh.ramp);
        glide.param(&mut self.volume, &mut fresh.volume);
    }

    /// Curve resolved on the last step.
    #[inline]
    pub fn curve(&self) -> BandCurve {
        self.curve
    }
}
