//! Multi-partial oscillator.
//!
//! Each partial runs its own phase accumulator at `freq * ratio`. The
//! partials are weighted, masked by any linked filter curves, averaged, and
//! scaled by `amp` before panning.

use modsynth_config::OscillatorDef;
use modsynth_core::range::{AMPLITUDE, FREQUENCY, PAN, PHASE};
use modsynth_core::{NoiseGen, Output, Param, Phase, Waveform};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// One partial: frequency ratio, level, fixed phase offset, and its running phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    /// Multiple of the oscillator frequency.
    pub ratio: f32,
    /// Level before averaging.
    pub amp: f32,
    /// Fixed phase offset in cycles.
    pub offset: f32,
    /// Running phase.
    pub phase: Phase,
}

/// Additive oscillator over a fixed waveform.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    freq: Param,
    cv: Sources,
    amp: Param,
    pan: Param,
    phase: Param,
    partials: Vec<Partial>,
    filters: Sources,
    noise: NoiseGen,
}

impl Oscillator {
    /// Build from a declaration. No partials means a single fundamental.
    pub fn from_def(def: &OscillatorDef, ctx: &BuildContext<'_>) -> Self {
        let mut partials: Vec<Partial> = def
            .partials
            .iter()
            .map(|p| Partial {
                ratio: p.ratio,
                amp: p.amp,
                offset: p.phase,
                phase: Phase::default(),
            })
            .collect();
        if partials.is_empty() {
            partials.push(Partial {
                ratio: 1.0,
                amp: 1.0,
                offset: 0.0,
                phase: Phase::default(),
            });
        }

        Self {
            waveform: def.wave.into(),
            freq: def.freq.to_param(FREQUENCY),
            cv: Sources::single(def.cv.as_deref()),
            amp: def.amp.to_param(AMPLITUDE),
            pan: def.pan.to_param(PAN),
            phase: def.phase.to_param(PHASE),
            partials,
            filters: Sources::new(def.filters.iter().cloned()),
            noise: NoiseGen::new(ctx.name_seed()),
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.freq.link(lookup);
        self.cv.link(lookup);
        self.amp.link(lookup);
        self.pan.link(lookup);
        self.phase.link(lookup);
        self.filters.link(lookup);
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

        let mut sum = 0.0;
        for partial in &mut self.partials {
            let partial_freq = freq * partial.ratio;
            let mask: f32 = self
                .filters
                .curves(signals)
                .map(|curve| curve.gain(partial_freq))
                .product();
            let x = self
                .waveform
                .sample(partial.phase.get() + partial.offset + offset, &mut self.noise);
            sum += x * partial.amp * mask;
            partial.phase.advance(partial_freq, ctx.sample_rate);
        }

        let mono = sum / self.partials.len() as f32 * amp;
        Output::panned(mono, pan)
    }

    pub(crate) fn update(&mut self, fresh: &mut Oscillator, glide: Glide) {
        self.waveform = fresh.waveform;
        glide.param(&mut self.freq, &mut fresh.freq);
        glide.param(&mut self.amp, &mut fresh.amp);
        glide.param(&mut self.pan, &mut fresh.pan);
        glide.param(&mut self.phase, &mut fresh.phase);
        self.cv.update(&mut fresh.cv);
        self.filters.update(&mut fresh.filters);

        // Partials that survive by position keep their running phase.
        for (new, old) in fresh.partials.iter_mut().zip(&self.partials) {
            new.phase = old.phase;
        }
        std::mem::swap(&mut self.partials, &mut fresh.partials);
    }

    /// Current partials, including their running phases.
    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Frequency parameter.
    pub fn freq(&self) -> &Param {
        &self.freq
    }

    /// Amplitude parameter.
    pub fn amp(&self) -> &Param {
        &self.amp
    }
}
