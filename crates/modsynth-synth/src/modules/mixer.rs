//! Weighted sum of named inputs.

use modsynth_config::MixerDef;
use modsynth_core::range::{AMPLITUDE, GAIN};
use modsynth_core::{Output, Param};

use super::{BuildContext, Glide, Lookup, StepContext};

#[derive(Debug, Clone)]
struct MixerInput {
    name: String,
    slot: Option<usize>,
    weight: Param,
}

/// Mixes inputs channel by channel: `gain * Σ weight_i * input_i`.
#[derive(Debug, Clone)]
pub struct Mixer {
    inputs: Vec<MixerInput>,
    gain: Param,
}

impl Mixer {
    /// Build from a declaration. Inputs are kept in name order.
    pub fn from_def(def: &MixerDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            inputs: def
                .inputs
                .iter()
                .map(|(name, weight)| MixerInput {
                    name: name.clone(),
                    slot: None,
                    weight: weight.to_param(AMPLITUDE),
                })
                .collect(),
            gain: def.gain.to_param(GAIN),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        for input in &mut self.inputs {
            input.slot = lookup(input.name.as_str());
            input.weight.link(lookup);
        }
        self.gain.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let mut sum = Output::SILENT;
        for input in &mut self.inputs {
            let weight = input.weight.next(signals);
            if let Some(slot) = input.slot {
                sum += signals.output(slot).scaled(weight);
            }
        }
        sum.scaled(self.gain.next(signals))
    }

    // Weights of inputs that keep their name glide; new inputs start at
    // their declared weight.
    pub(crate) fn update(&mut self, fresh: &mut Mixer, glide: Glide) {
        for new in &mut fresh.inputs {
            if let Some(old) = self.inputs.iter_mut().find(|old| old.name == new.name) {
                std::mem::swap(&mut new.weight, &mut old.weight);
                glide.param(&mut new.weight, &mut old.weight);
            }
        }
        std::mem::swap(&mut self.inputs, &mut fresh.inputs);
        glide.param(&mut self.gain, &mut fresh.gain);
    }

    /// Input names in mixing order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|input| input.name.as_str())
    }

    /// Current base weight of `name`, if it is an input.
    pub fn weight(&self, name: &str) -> Option<f32> {
        self.inputs
            .iter()
            .find(|input| input.name == name)
            .map(|input| input.weight.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::ParamDef;
    use modsynth_core::Signals;
    use std::collections::BTreeMap;

    fn mixer(inputs: &[(&str, f32)], gain: f32) -> Mixer {
        let def = MixerDef {
            inputs: inputs
                .iter()
                .map(|&(name, w)| (name.to_string(), ParamDef::value(w)))
                .collect::<BTreeMap<_, _>>(),
            gain: ParamDef::value(gain),
        };
        let mut mixer = Mixer::from_def(&def, &BuildContext { name: "mix", sample_rate: 1.0 });
        mixer.link(&|name| match name {
            "a" => Some(0),
            "b" => Some(1),
            _ => None,
        });
        mixer
    }

    fn signals() -> Signals {
        let mut signals = Signals::with_len(2);
        signals.record(0, Output::new(1.0, 1.0, 0.0), None, 1.0);
        signals.record(1, Output::new(0.5, 0.0, 0.5), None, 1.0);
        signals
    }

    fn step(mixer: &mut Mixer, signals: &Signals) -> Output {
        mixer.step(&StepContext {
            signals,
            time: 0.0,
            sample_rate: 1.0,
        })
    }

    #[test]
    fn weights_each_channel() {
        let mut m = mixer(&[("a", 0.5), ("b", 1.0)], 1.0);
        assert_eq!(step(&mut m, &signals()), Output::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn gain_can_invert() {
        let mut m = mixer(&[("a", 1.0)], -0.5);
        assert_eq!(step(&mut m, &signals()), Output::new(-0.5, -0.5, -0.0));
    }

    #[test]
    fn unknown_inputs_are_silent() {
        let mut m = mixer(&[("ghost", 1.0)], 1.0);
        assert_eq!(step(&mut m, &signals()), Output::SILENT);
    }

    #[test]
    fn update_matches_inputs_by_name() {
        let mut live = mixer(&[("a", 0.5), ("b", 1.0)], 1.0);
        let mut fresh = mixer(&[("b", 0.25), ("ghost", 1.0)], 1.0);
        live.update(&mut fresh, Glide { seconds: 1.0, sample_rate: 4.0 });

        assert_eq!(live.input_names().collect::<Vec<_>>(), ["b", "ghost"]);
        // "b" keeps its current weight and glides toward the new one.
        assert_eq!(live.weight("b"), Some(1.0));
        assert_eq!(live.weight("ghost"), Some(1.0));
        assert_eq!(live.weight("a"), None);
    }
}
