//! Tempo-clocked ±1 gate pattern.

use modsynth_config::GateDef;
use modsynth_core::range::BPM;
use modsynth_core::{Output, Param, beats_per_sample, to_clock};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Steps through a clock pattern, one entry per beat.
///
/// The read index is fractional and advances by `1 / samples_per_beat` each
/// sample, so tempo changes take effect immediately without resetting the
/// pattern. A tempo of zero freezes it.
#[derive(Debug, Clone)]
pub struct Gate {
    pattern: Vec<f32>,
    bpm: Param,
    cv: Sources,
    index: f64,
}

impl Gate {
    /// Build from a declaration, coercing the pattern to ±1.
    pub fn from_def(def: &GateDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            pattern: to_clock(&def.signal),
            bpm: def.bpm.to_param(BPM),
            cv: Sources::single(def.cv.as_deref()),
            index: 0.0,
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.bpm.link(lookup);
        self.cv.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let declared = self.bpm.advance();
        let base = if self.cv.is_linked() {
            BPM.from_cv(self.cv.mono(signals))
        } else {
            declared
        };
        let bpm = self.bpm.resolve_from(base, signals);

        if self.pattern.is_empty() {
            return Output::SILENT;
        }

        let len = self.pattern.len() as f64;
        let value = self.pattern[(self.index as usize).min(self.pattern.len() - 1)];
        self.index = (self.index + f64::from(beats_per_sample(ctx.sample_rate, bpm))).rem_euclid(len);

        Output::panned(value, 0.0)
    }

    pub(crate) fn update(&mut self, fresh: &mut Gate, glide: Glide) {
        std::mem::swap(&mut self.pattern, &mut fresh.pattern);
        glide.param(&mut self.bpm, &mut fresh.bpm);
        self.cv.update(&mut fresh.cv);
        if !self.pattern.is_empty() {
            self.index = self.index.rem_euclid(self.pattern.len() as f64);
        } else {
            self.index = 0.0;
        }
    }

    /// Fractional read index in beats.
    pub fn index(&self) -> f64 {
        self.index
    }

    /// Tempo parameter.
    pub fn bpm(&self) -> &Param {
        &self.bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::ParamDef;
    use modsynth_core::Signals;

    fn gate(def: GateDef) -> Gate {
        Gate::from_def(&def, &BuildContext { name: "g", sample_rate: 2.0 })
    }

    fn run(gate: &mut Gate, n: usize) -> Vec<f32> {
        let signals = Signals::default();
        (0..n)
            .map(|_| {
                gate.step(&StepContext {
                    signals: &signals,
                    time: 0.0,
                    sample_rate: 2.0,
                })
                .mono
            })
            .collect()
    }

    #[test]
    fn one_beat_per_two_samples_at_sixty_bpm() {
        let mut g = gate(GateDef {
            signal: vec![1.0, 0.0, 3.0],
            bpm: ParamDef::value(60.0),
            cv: None,
        });
        assert_eq!(run(&mut g, 7), [1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn zero_bpm_freezes() {
        let mut g = gate(GateDef {
            signal: vec![-1.0, 1.0],
            bpm: ParamDef::value(0.0),
            cv: None,
        });
        assert_eq!(run(&mut g, 3), [-1.0, -1.0, -1.0]);
        assert_eq!(g.index(), 0.0);
    }

    #[test]
    fn empty_pattern_is_silent() {
        let mut g = gate(GateDef::default());
        assert_eq!(run(&mut g, 2), [0.0, 0.0]);
    }

    #[test]
    fn update_keeps_position_inside_new_pattern() {
        let mut live = gate(GateDef {
            signal: vec![1.0, 1.0, 1.0, -1.0],
            bpm: ParamDef::value(60.0),
            cv: None,
        });
        run(&mut live, 6);
        assert_eq!(live.index(), 3.0);

        let mut fresh = gate(GateDef {
            signal: vec![1.0, -1.0],
            bpm: ParamDef::value(120.0),
            cv: None,
        });
        live.update(&mut fresh, Glide { seconds: 0.0, sample_rate: 2.0 });
        assert_eq!(live.index(), 1.0);
        assert_eq!(live.bpm().target(), 120.0);
    }
}
