//! Feedback comb delay.

use modsynth_config::DelayDef;
use modsynth_core::range::{MIX, PAN};
use modsynth_core::{Comb, Output, Param, delay_samples};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Sums its inputs' mono outputs through a feedback comb.
///
/// The buffer holds `ceil(time * sample_rate)` samples. A hot-swap that
/// changes `time` resizes the buffer in place, keeping what is already in it.
#[derive(Debug, Clone)]
pub struct Delay {
    inputs: Sources,
    time: f32,
    mix: Param,
    pan: Param,
    comb: Comb,
    sample_rate: f32,
}

impl Delay {
    /// Build from a declaration, sizing the buffer.
    pub fn from_def(def: &DelayDef, ctx: &BuildContext<'_>) -> Self {
        let mut comb = Comb::default();
        comb.initialize(def.time, ctx.sample_rate);
        Self {
            inputs: Sources::new(def.inputs.iter().cloned()),
            time: def.time,
            mix: def.mix.to_param(MIX),
            pan: def.pan.to_param(PAN),
            comb,
            sample_rate: ctx.sample_rate,
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.inputs.link(lookup);
        self.mix.link(lookup);
        self.pan.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let mix = self.mix.next(signals);
        let pan = self.pan.next(signals);
        let y = self.comb.step(self.inputs.mono(signals), mix);
        Output::panned(y, pan)
    }

    pub(crate) fn update(&mut self, fresh: &mut Delay, glide: Glide) {
        self.inputs.update(&mut fresh.inputs);
        glide.param(&mut self.mix, &mut fresh.mix);
        glide.param(&mut self.pan, &mut fresh.pan);
        if fresh.time != self.time || fresh.sample_rate != self.sample_rate {
            self.comb.resize(delay_samples(fresh.time, fresh.sample_rate));
            self.time = fresh.time;
            self.sample_rate = fresh.sample_rate;
        }
    }

    /// Delay line.
    pub fn comb(&self) -> &Comb {
        &self.comb
    }

    /// Mix parameter.
    pub fn mix(&self) -> &Param {
        &self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::ParamDef;
    use modsynth_core::Signals;

    fn delay(time: f32, mix: f32) -> Delay {
        let def = DelayDef {
            inputs: vec!["src".into()],
            time,
            mix: ParamDef::value(mix),
            pan: ParamDef::default(),
        };
        let mut d = Delay::from_def(&def, &BuildContext { name: "d", sample_rate: 4.0 });
        d.link(&|name| (name == "src").then_some(0));
        d
    }

    fn drive(d: &mut Delay, input: &[f32]) -> Vec<f32> {
        let mut signals = Signals::with_len(1);
        input
            .iter()
            .map(|&x| {
                signals.record(0, Output::panned(x, 0.0), None, 4.0);
                d.step(&StepContext {
                    signals: &signals,
                    time: 0.0,
                    sample_rate: 4.0,
                })
                .mono
            })
            .collect()
    }

    #[test]
    fn echoes_after_buffer_length() {
        let mut d = delay(0.5, 0.5);
        assert_eq!(d.comb().len(), 2);
        let out = drive(&mut d, &[1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, [0.5, 0.0, 0.25, 0.0, 0.125]);
    }

    #[test]
    fn zero_time_passes_through() {
        let mut d = delay(0.0, 0.5);
        assert_eq!(drive(&mut d, &[0.3, -0.6]), [0.3, -0.6]);
    }

    #[test]
    fn update_resizes_and_keeps_content() {
        let mut live = delay(0.5, 0.5);
        drive(&mut live, &[1.0]);
        let mut fresh = delay(1.0, 0.25);
        live.update(&mut fresh, Glide { seconds: 0.0, sample_rate: 4.0 });

        assert_eq!(live.comb().len(), 4);
        assert_eq!(live.comb().buffer(), [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(live.comb().index(), 1);
        assert_eq!(live.mix().target(), 0.25);
    }
}
