//! Table playback indexed by absolute time.
//!
//! The read position is `(t * freq + offset) * len`, where `offset` is the
//! modulation depth times the running integrals of `freq`'s sources. Driving
//! the position through integrals rather than instantaneous values keeps the
//! playback phase continuous under frequency modulation.

use modsynth_config::WavetableDef;
use modsynth_core::range::{AMPLITUDE, FREQUENCY, PAN};
use modsynth_core::{Output, Param, normalize};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Wavetable player.
#[derive(Debug, Clone)]
pub struct Wavetable {
    table: Vec<f32>,
    freq: Param,
    cv: Sources,
    amp: Param,
    pan: Param,
}

impl Wavetable {
    /// Build from a declaration, normalizing the table into [-1, 1].
    pub fn from_def(def: &WavetableDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            table: normalize(&def.signal),
            freq: def.freq.to_param(FREQUENCY),
            cv: Sources::single(def.cv.as_deref()),
            amp: def.amp.to_param(AMPLITUDE),
            pan: def.pan.to_param(PAN),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.freq.link(lookup);
        self.cv.link(lookup);
        self.amp.link(lookup);
        self.pan.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let declared = self.freq.advance();
        let amp = self.amp.next(signals);
        let pan = self.pan.next(signals);

        if self.table.is_empty() {
            return Output::SILENT;
        }

        let freq = if self.cv.is_linked() {
            FREQUENCY.from_cv(self.cv.mono(signals))
        } else {
            FREQUENCY.clamp(declared)
        };
        let offset = self.freq.integral_offset(signals);
        let len = self.table.len() as i64;
        let position = ((ctx.time * f64::from(freq) + offset) * len as f64).floor() as i64;
        let index = position.rem_euclid(len) as usize;

        Output::panned(self.table[index] * amp, pan)
    }

    pub(crate) fn update(&mut self, fresh: &mut Wavetable, glide: Glide) {
        std::mem::swap(&mut self.table, &mut fresh.table);
        glide.param(&mut self.freq, &mut fresh.freq);
        glide.param(&mut self.amp, &mut fresh.amp);
        glide.param(&mut self.pan, &mut fresh.pan);
        self.cv.update(&mut fresh.cv);
    }

    /// Normalized table.
    pub fn table(&self) -> &[f32] {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::ParamDef;
    use modsynth_core::Signals;

    fn build(def: &WavetableDef) -> Wavetable {
        Wavetable::from_def(
            def,
            &BuildContext {
                name: "wt",
                sample_rate: 4.0,
            },
        )
    }

    fn at(table: &mut Wavetable, signals: &Signals, time: f64) -> f32 {
        table
            .step(&StepContext {
                signals,
                time,
                sample_rate: 4.0,
            })
            .mono
    }

    #[test]
    fn normalizes_on_build() {
        let table = build(&WavetableDef {
            signal: vec![0.0, 2.0, 0.0, -4.0],
            ..WavetableDef::default()
        });
        assert_eq!(table.table(), [0.0, 0.5, 0.0, -1.0]);
    }

    #[test]
    fn reads_by_time() {
        let mut table = build(&WavetableDef {
            signal: vec![0.0, 1.0, 0.0, -1.0],
            ..WavetableDef::default()
        });
        let signals = Signals::default();
        let values: Vec<f32> = [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|&t| at(&mut table, &signals, t))
            .collect();
        assert_eq!(values, [0.0, 1.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn integral_offsets_position() {
        let mut table = build(&WavetableDef {
            signal: vec![0.0, 1.0, 0.0, -1.0],
            freq: ParamDef::value(0.0).modulated(["fm"], 1.0),
            ..WavetableDef::default()
        });
        table.link(&|name| (name == "fm").then_some(0));

        let mut signals = Signals::with_len(1);
        // Integral of 0.25 shifts the read position by a quarter table.
        signals.record(0, Output::new(1.0, 1.0, 1.0), None, 4.0);
        assert_eq!(at(&mut table, &signals, 0.0), 1.0);
    }

    #[test]
    fn empty_table_is_silent() {
        let mut table = build(&WavetableDef::default());
        assert_eq!(at(&mut table, &Signals::default(), 0.3), 0.0);
    }
}
