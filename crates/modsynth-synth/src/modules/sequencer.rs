//! Trigger-stepped note sequencer.
//!
//! Notes are parsed once at load time. The sequencer starts on the first
//! note and moves one step (or to a random step) on every rising edge of its
//! summed triggers. The current note's frequency is emitted as control
//! voltage on the frequency range, ready to drive an oscillator's `cv`.

use modsynth_config::SequencerDef;
use modsynth_core::range::FREQUENCY;
use modsynth_core::{NoiseGen, Output, note_to_freq};

use super::{BuildContext, Glide, Lookup, RisingEdge, Sources, StepContext};
use crate::error::SynthError;

/// Note sequencer.
#[derive(Debug, Clone)]
pub struct Sequencer {
    /// Note frequencies in Hz
    notes: Vec<f32>,
    triggers: Sources,
    edge: RisingEdge,
    position: usize,
    randomize: bool,
    rng: NoiseGen,
}

impl Sequencer {
    /// Build from a declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::InvalidNote`] for the first step that is not a
    /// valid `name_octave` note.
    pub fn from_def(def: &SequencerDef, ctx: &BuildContext<'_>) -> Result<Self, SynthError> {
        let notes = def
            .sequence
            .iter()
            .map(|note| {
                note_to_freq(note, def.pitch, def.transpose).map_err(|reason| {
                    SynthError::InvalidNote {
                        module: ctx.name.to_string(),
                        note: note.clone(),
                        reason,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            notes,
            triggers: Sources::new(def.triggers.iter().cloned()),
            edge: RisingEdge::default(),
            position: 0,
            randomize: def.randomize,
            rng: NoiseGen::new(def.seed.unwrap_or_else(|| ctx.name_seed())),
        })
    }

    pub(crate) fn link(&mut self, lookup: Lookup<'_>) {
        self.triggers.link(lookup);
    }

    pub(crate) fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        if self.notes.is_empty() {
            return Output::SILENT;
        }

        if self.edge.detect(self.triggers.mono(ctx.signals)) {
            self.position = if self.randomize {
                self.rng.next_below(self.notes.len())
            } else {
                (self.position + 1) % self.notes.len()
            };
        }

        Output::panned(FREQUENCY.to_cv(self.notes[self.position]), 0.0)
    }

    pub(crate) fn update(&mut self, fresh: &mut Sequencer, _glide: Glide) {
        std::mem::swap(&mut self.notes, &mut fresh.notes);
        self.triggers.update(&mut fresh.triggers);
        self.randomize = fresh.randomize;
        if self.position >= self.notes.len() {
            self.position = 0;
        }
    }

    /// Index of the current step.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Step frequencies in Hz.
    pub fn notes(&self) -> &[f32] {
        &self.notes
    }

    /// Frequency of the current step, if any.
    pub fn frequency(&self) -> Option<f32> {
        self.notes.get(self.position).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_core::Signals;

    const CTX: BuildContext<'static> = BuildContext {
        name: "seq",
        sample_rate: 1.0,
    };

    fn sequencer(notes: &[&str], randomize: bool) -> Sequencer {
        let def = SequencerDef {
            sequence: notes.iter().map(|n| n.to_string()).collect(),
            triggers: vec!["clock".into()],
            randomize,
            ..SequencerDef::default()
        };
        let mut seq = Sequencer::from_def(&def, &CTX).expect("valid notes");
        seq.link(&|name| (name == "clock").then_some(0));
        seq
    }

    fn drive(seq: &mut Sequencer, clock: &[f32]) -> Vec<usize> {
        let mut signals = Signals::with_len(1);
        clock
            .iter()
            .map(|&c| {
                signals.record(0, Output::panned(c, 0.0), None, 1.0);
                seq.step(&StepContext {
                    signals: &signals,
                    time: 0.0,
                    sample_rate: 1.0,
                });
                seq.position()
            })
            .collect()
    }

    #[test]
    fn advances_on_rising_edges_only() {
        let mut seq = sequencer(&["a_4", "a_5", "c_4"], false);
        let positions = drive(&mut seq, &[-1.0, 1.0, 1.0, -1.0, 0.0, 1.0, -1.0, 1.0]);
        assert_eq!(positions, [0, 1, 1, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn emits_frequency_as_cv() {
        let mut seq = sequencer(&["a_4"], false);
        let out = seq.step(&StepContext {
            signals: &Signals::default(),
            time: 0.0,
            sample_rate: 1.0,
        });
        assert!((FREQUENCY.from_cv(out.mono) - 440.0).abs() < 0.01);
        assert_eq!(seq.frequency(), Some(440.0));
    }

    #[test]
    fn transpose_and_pitch_apply() {
        let def = SequencerDef {
            sequence: vec!["a_4".into(), "a_5".into()],
            pitch: 432.0,
            transpose: 12.0,
            ..SequencerDef::default()
        };
        let seq = Sequencer::from_def(&def, &CTX).expect("valid notes");
        assert_eq!(seq.notes(), [864.0, 1728.0]);
    }

    #[test]
    fn random_steps_stay_in_bounds() {
        let mut seq = sequencer(&["a_4", "b_4", "c_4", "d_4"], true);
        let clock: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        assert!(drive(&mut seq, &clock).iter().all(|&p| p < 4));
    }

    #[test]
    fn invalid_note_names_the_module() {
        let def = SequencerDef {
            sequence: vec!["a_4".into(), "h_2".into()],
            ..SequencerDef::default()
        };
        match Sequencer::from_def(&def, &CTX) {
            Err(SynthError::InvalidNote { module, note, .. }) => {
                assert_eq!(module, "seq");
                assert_eq!(note, "h_2");
            }
            other => panic!("expected invalid note, got {other:?}"),
        }
    }

    #[test]
    fn empty_sequence_is_silent() {
        let mut seq = sequencer(&[], false);
        assert_eq!(drive(&mut seq, &[1.0, 0.0, 1.0]), [0, 0, 0]);
    }
}
