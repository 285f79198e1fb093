//! Table-lookup oscillator shared by user signals and text.

use modsynth_config::{ParamDef, SignalDef, TextDef};
use modsynth_core::range::{AMPLITUDE, FREQUENCY, PAN, PHASE};
use modsynth_core::{Output, Param, Phase, normalize, text_to_table, wrap_phase};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Plays one cycle of a sample table with its own phase accumulator.
///
/// Unlike [`Wavetable`](super::Wavetable), frequency modulation acts
/// through instantaneous outputs, exactly like an oscillator.
#[derive(Debug, Clone)]
pub struct TableOscillator {
    table: Vec<f32>,
    freq: Param,
    cv: Sources,
    amp: Param,
    pan: Param,
    phase: Param,
    accumulator: Phase,
}

impl TableOscillator {
    /// Build from a user sample table.
    pub fn from_signal(def: &SignalDef, _ctx: &BuildContext<'_>) -> Self {
        Self::build(
            normalize(&def.signal),
            [&def.freq, &def.amp, &def.pan, &def.phase],
            def.cv.as_deref(),
        )
    }

    /// Build from text, one byte per sample.
    pub fn from_text(def: &TextDef, _ctx: &BuildContext<'_>) -> Self {
        Self::build(
            normalize(&text_to_table(&def.text)),
            [&def.freq, &def.amp, &def.pan, &def.phase],
            def.cv.as_deref(),
        )
    }

    fn build(
        table: Vec<f32>,
        [freq, amp, pan, phase]: [&ParamDef; 4],
        cv: Option<&str>,
    ) -> Self {
        Self {
            table,
            freq: freq.to_param(FREQUENCY),
            cv: Sources::single(cv),
            amp: amp.to_param(AMPLITUDE),
            pan: pan.to_param(PAN),
            phase: phase.to_param(PHASE),
            accumulator: Phase::default(),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.freq.link(lookup);
        self.cv.link(lookup);
        self.amp.link(lookup);
        self.pan.link(lookup);
        self.phase.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let declared = self.freq.advance();
        let base = if self.cv.is_linked() {
            FREQUENCY.from_cv(self.cv.mono(signals))
        } else {
            declared
        };
        let freq = self.freq.resolve_from(base, signals);
        let amp = self.amp.next(signals);
        let pan = self.pan.next(signals);
        let offset = self.phase.next(signals);

        let value = if self.table.is_empty() {
            0.0
        } else {
            let len = self.table.len();
            let position = wrap_phase(self.accumulator.get() + offset) * len as f32;
            self.table[(position as usize).min(len - 1)]
        };
        self.accumulator.advance(freq, ctx.sample_rate);

        Output::panned(value * amp, pan)
    }

    pub(crate) fn update(&mut self, fresh: &mut TableOscillator, glide: Glide) {
        std::mem::swap(&mut self.table, &mut fresh.table);
        glide.param(&mut self.freq, &mut fresh.freq);
        glide.param(&mut self.amp, &mut fresh.amp);
        glide.param(&mut self.pan, &mut fresh.pan);
        glide.param(&mut self.phase, &mut fresh.phase);
        self.cv.update(&mut fresh.cv);
    }

    /// Normalized table.
    pub fn table(&self) -> &[f32] {
        &self.table
    }

    /// Running phase in cycles.
    pub fn phase(&self) -> f32 {
        self.accumulator.get()
    }
}
