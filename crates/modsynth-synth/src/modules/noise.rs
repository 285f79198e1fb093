//! Seeded white noise.

use modsynth_config::NoiseDef;
use modsynth_core::range::{AMPLITUDE, PAN};
use modsynth_core::{NoiseGen, Output, Param};

use super::{BuildContext, Glide, Lookup, StepContext};

/// Uniform white noise in `[-amp, amp]`.
///
/// Without an explicit seed the generator is seeded from the module name,
/// so a patch renders identically every time.
#[derive(Debug, Clone)]
pub struct Noise {
    amp: Param,
    pan: Param,
    rng: NoiseGen,
}

impl Noise {
    /// Build from a declaration.
    pub fn from_def(def: &NoiseDef, ctx: &BuildContext<'_>) -> Self {
        Self {
            amp: def.amp.to_param(AMPLITUDE),
            pan: def.pan.to_param(PAN),
            rng: NoiseGen::new(def.seed.unwrap_or_else(|| ctx.name_seed())),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.amp.link(lookup);
        self.pan.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let amp = self.amp.next(ctx.signals);
        let pan = self.pan.next(ctx.signals);
        Output::panned(self.rng.next_bipolar() * amp, pan)
    }

    // The generator keeps running; a new seed only applies to fresh instances.
    pub(crate) fn update(&mut self, fresh: &mut Noise, glide: Glide) {
        glide.param(&mut self.amp, &mut fresh.amp);
        glide.param(&mut self.pan, &mut fresh.pan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::ParamDef;
    use modsynth_core::Signals;

    fn render(def: &NoiseDef, name: &str, n: usize) -> Vec<f32> {
        let mut noise = Noise::from_def(
            def,
            &BuildContext {
                name,
                sample_rate: 48000.0,
            },
        );
        let signals = Signals::default();
        (0..n)
            .map(|_| {
                noise
                    .step(&StepContext {
                        signals: &signals,
                        time: 0.0,
                        sample_rate: 48000.0,
                    })
                    .mono
            })
            .collect()
    }

    #[test]
    fn bounded_by_amp() {
        let def = NoiseDef {
            amp: ParamDef::value(0.25),
            ..NoiseDef::default()
        };
        assert!(render(&def, "n", 2000).iter().all(|x| x.abs() <= 0.25));
    }

    #[test]
    fn seed_is_reproducible() {
        let seeded = NoiseDef {
            seed: Some(9),
            ..NoiseDef::default()
        };
        assert_eq!(render(&seeded, "a", 64), render(&seeded, "b", 64));
        let unseeded = NoiseDef::default();
        assert_eq!(render(&unseeded, "a", 64), render(&unseeded, "a", 64));
        assert_ne!(render(&unseeded, "a", 64), render(&unseeded, "b", 64));
    }
}
