//! Threshold-triggered ADSR envelope.
//!
//! The envelope arms while idle and fires when the magnitude of its summed
//! trigger inputs rises through `threshold`. Once fired it runs through
//! attack, decay, sustain, and release as straight lines over absolute time,
//! then returns to idle and re-arms. Triggers arriving mid-envelope are
//! ignored.
//!
//! ```text
//! peak   /\
//!       /  \______ level
//!      /          \
//! 0 __/            \___
//!     |a |d |  s   |r |
//! ```

use modsynth_config::EnvelopeDef;
use modsynth_core::range::{AMPLITUDE, THRESHOLD, TIME};
use modsynth_core::{Output, Param};

use super::{BuildContext, Glide, Lookup, Sources, StepContext};

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Armed, output zero.
    #[default]
    Idle,
    /// Rising from 0 to `peak`.
    Attack,
    /// Falling from `peak` to `level`.
    Decay,
    /// Holding `level`.
    Sustain,
    /// Falling from `level` to 0.
    Release,
}

/// Segment durations (seconds) and levels of one envelope pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnvelopeShape {
    /// Attack duration.
    pub attack: f32,
    /// Decay duration.
    pub decay: f32,
    /// Sustain duration.
    pub sustain: f32,
    /// Release duration.
    pub release: f32,
    /// Level at the end of the attack.
    pub peak: f32,
    /// Sustain level.
    pub level: f32,
}

impl EnvelopeShape {
    /// Stage and value `elapsed` seconds after the trigger.
    ///
    /// Segment ends are inclusive: at exactly `elapsed == attack` the
    /// envelope is still attacking and sits at `peak`.
    ///
    /// ```rust
    /// use modsynth_synth::modules::{EnvelopeShape, EnvelopeStage};
    ///
    /// let shape = EnvelopeShape { attack: 2.0, peak: 1.0, level: 1.0, ..Default::default() };
    /// assert_eq!(shape.value_at(1.0), (EnvelopeStage::Attack, 0.5));
    /// assert_eq!(shape.value_at(2.5), (EnvelopeStage::Idle, 0.0));
    /// ```
    pub fn value_at(&self, elapsed: f64) -> (EnvelopeStage, f32) {
        let attack_end = f64::from(self.attack);
        let decay_end = attack_end + f64::from(self.decay);
        let sustain_end = decay_end + f64::from(self.sustain);
        let release_end = sustain_end + f64::from(self.release);

        if elapsed < 0.0 {
            (EnvelopeStage::Idle, 0.0)
        } else if elapsed <= attack_end {
            let v = segment(0.0, self.peak, 0.0, self.attack, elapsed);
            (EnvelopeStage::Attack, v)
        } else if elapsed <= decay_end {
            let v = segment(self.peak, self.level, attack_end, self.decay, elapsed);
            (EnvelopeStage::Decay, v)
        } else if elapsed <= sustain_end {
            (EnvelopeStage::Sustain, self.level)
        } else if elapsed <= release_end {
            let v = segment(self.level, 0.0, sustain_end, self.release, elapsed);
            (EnvelopeStage::Release, v)
        } else {
            (EnvelopeStage::Idle, 0.0)
        }
    }
}

/// Straight line from `from` to `to` over `[start, start + length]`.
fn segment(from: f32, to: f32, start: f64, length: f32, elapsed: f64) -> f32 {
    if length <= 0.0 {
        return to;
    }
    let progress = ((elapsed - start) / f64::from(length)) as f32;
    from + (to - from) * progress
}

/// Triggered envelope module.
#[derive(Debug, Clone)]
pub struct Envelope {
    triggers: Sources,
    threshold: Param,
    attack: Param,
    decay: Param,
    sustain: Param,
    release: Param,
    peak: Param,
    level: Param,
    negative: bool,
    /// Trigger magnitude seen on the previous sample
    previous: f32,
    /// Time the running pass started, if any
    triggered_at: Option<f64>,
    stage: EnvelopeStage,
}

impl Envelope {
    /// Build from a declaration.
    pub fn from_def(def: &EnvelopeDef, _ctx: &BuildContext<'_>) -> Self {
        Self {
            triggers: Sources::new(def.triggers.iter().cloned()),
            threshold: def.threshold.to_param(THRESHOLD),
            attack: def.attack.to_param(TIME),
            decay: def.decay.to_param(TIME),
            sustain: def.sustain.to_param(TIME),
            release: def.release.to_param(TIME),
            peak: def.peak.to_param(AMPLITUDE),
            level: def.level.to_param(AMPLITUDE),
            negative: def.negative,
            previous: 0.0,
            triggered_at: None,
            stage: EnvelopeStage::Idle,
        }
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.triggers.link(lookup);
        self.threshold.link(lookup);
        self.attack.link(lookup);
        self.decay.link(lookup);
        self.sustain.link(lookup);
        self.release.link(lookup);
        self.peak.link(lookup);
        self.level.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        let signals = ctx.signals;
        let threshold = self.threshold.next(signals);
        let shape = EnvelopeShape {
            attack: self.attack.next(signals),
            decay: self.decay.next(signals),
            sustain: self.sustain.next(signals),
            release: self.release.next(signals),
            peak: self.peak.next(signals),
            level: self.level.next(signals),
        };

        let trigger = self.triggers.mono(signals).abs();
        if self.triggered_at.is_none() && self.previous < threshold && trigger >= threshold {
            self.triggered_at = Some(ctx.time);
        }
        self.previous = trigger;

        let value = match self.triggered_at {
            Some(start) => {
                let (stage, value) = shape.value_at(ctx.time - start);
                self.stage = stage;
                if stage == EnvelopeStage::Idle {
                    self.triggered_at = None;
                }
                value
            }
            None => {
                self.stage = EnvelopeStage::Idle;
                0.0
            }
        };

        let value = if self.negative { -value } else { value };
        Output::panned(value, 0.0)
    }

    // Trigger state and the running pass carry over; the new shape applies
    // from the next sample.
    pub(crate) fn update(&mut self, fresh: &mut Envelope, glide: Glide) {
        self.triggers.update(&mut fresh.triggers);
        glide.param(&mut self.threshold, &mut fresh.threshold);
        glide.param(&mut self.attack, &mut fresh.attack);
        glide.param(&mut self.decay, &mut fresh.decay);
        glide.param(&mut self.sustain, &mut fresh.sustain);
        glide.param(&mut self.release, &mut fresh.release);
        glide.param(&mut self.peak, &mut fresh.peak);
        glide.param(&mut self.level, &mut fresh.level);
        self.negative = fresh.negative;
    }

    /// Stage reached on the last step.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
