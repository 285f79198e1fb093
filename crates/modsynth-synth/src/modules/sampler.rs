//! Edge-triggered sample-and-hold.

use modsynth_config::SamplerDef;
use modsynth_core::Output;

use super::{BuildContext, Glide, Lookup, RisingEdge, Sources, StepContext};

/// Copies its input's whole output on a rising trigger edge and holds it.
#[derive(Debug, Clone)]
pub struct Sampler {
    input: Sources,
    triggers: Sources,
    edge: RisingEdge,
    held: Output,
}

impl Sampler {
    /// Build from a declaration.
    pub fn from_def(def: &SamplerDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            input: Sources::single(Some(def.input.as_str())),
            triggers: Sources::new(def.triggers.iter().cloned()),
            edge: RisingEdge::default(),
            held: Output::SILENT,
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.input.link(lookup);
        self.triggers.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        if self.edge.detect(self.triggers.mono(ctx.signals)) {
            self.held = self.input.output(ctx.signals);
        }
        self.held
    }

    pub(crate) fn update(&mut self, fresh: &mut Sampler, _glide: Glide) {
        self.input.update(&mut fresh.input);
        self.triggers.update(&mut fresh.triggers);
    }
}
