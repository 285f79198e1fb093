//! Re-panner.

use modsynth_config::PanDef;
use modsynth_core::range::PAN;
use modsynth_core::{Output, Param};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Places an input's mono output in the stereo field.
#[derive(Debug, Clone)]
pub struct Pan {
    input: Sources,
    pan: Param,
}

impl Pan {
    /// Build from a declaration.
    pub fn from_def(def: &PanDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            input: Sources::single(Some(def.input.as_str())),
            pan: def.pan.to_param(PAN),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.input.link(lookup);
        self.pan.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let pan = self.pan.next(ctx.signals);
        Output::panned(self.input.mono(ctx.signals), pan)
    }

    pub(crate) fn update(&mut self, fresh: &mut Pan, glide: Glide) {
        self.input.update(&mut fresh.input);
        glide.param(&mut self.pan, &mut fresh.pan);
    }
}
