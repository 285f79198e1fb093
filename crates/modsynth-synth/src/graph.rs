//! Named module graph evaluated once per sample.
//!
//! [`SynthGraph`] owns one slot per declared module, ordered by kind in
//! evaluation order and by name within a kind. Each call to
//! [`next`](SynthGraph::next) steps every slot and records its output in the
//! shared [`Signals`] snapshot immediately, so a module reading another sees
//! this pass's value for slots evaluated before it and the previous pass's
//! value for itself and every later slot. Cyclic and self modulation are
//! therefore well-defined without any topological sort.
//!
//! ## Hot-swap
//!
//! [`load_synth`](SynthGraph::load_synth) builds a complete fresh graph from
//! the new patch first, so a bad patch leaves the live graph untouched. The
//! fresh graph is then spliced in:
//!
//! - names kept with the same kind keep their live instance (phase, buffers,
//!   trigger state) and take the new configuration through `update`, with
//!   changed values gliding over the patch's `glide`
//! - names that disappeared are dropped
//! - new names start from their freshly built state
//!
//! [`splice`](SynthGraph::splice) leaves the previous graph in the value
//! it was handed, so the caller decides on which thread it is dropped.
//!
//! ```rust
//! use modsynth_config::Patch;
//! use modsynth_synth::SynthGraph;
//!
//! let patch = Patch::from_toml(r#"
//! out = ["tone"]
//! [oscillators.tone]
//! freq = 220
//! "#).unwrap();
//!
//! let mut graph = SynthGraph::new(&patch, 48000.0).unwrap();
//! let first = graph.next();
//! assert_eq!(first.mono, 0.0);
//! assert_eq!(graph.samples(), 1);
//! ```

use std::collections::HashMap;

use modsynth_config::{ModuleKind, Patch, validate_patch};
use modsynth_core::range::AMPLITUDE;
use modsynth_core::{Fader, Output, Signals};

use crate::error::SynthError;
use crate::modules::{BuildContext, Glide, Module, StepContext};

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    module: Module,
}

/// Counts of what a splice kept, added, and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceReport {
    /// Modules that kept their live instance.
    pub retained: usize,
    /// Modules built fresh (new names, or names whose kind changed).
    pub added: usize,
    /// Live modules that were dropped.
    pub removed: usize,
}

/// A running synth: modules, output bus, and master volume.
#[derive(Debug, Clone)]
pub struct SynthGraph {
    name: Option<String>,
    sample_rate: f32,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    signals: Signals,
    /// Slot indices summed into the master output
    bus: Vec<usize>,
    volume: Fader,
    configured_volume: f32,
    glide: f32,
    samples: u64,
}

impl SynthGraph {
    /// Validate `patch` and build every module.
    ///
    /// Output names that match no module are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Validation`] for duplicate or malformed names
    /// and non-finite values, and [`SynthError::InvalidNote`] for a sequencer
    /// step that does not parse.
    pub fn new(patch: &Patch, sample_rate: f32) -> Result<Self, SynthError> {
        validate_patch(patch)?;

        let mut slots = Vec::with_capacity(patch.len());
        for (name, def) in patch.modules() {
            let ctx = BuildContext { name, sample_rate };
            slots.push(Slot {
                name: name.to_string(),
                module: Module::from_def(def, &ctx)?,
            });
        }

        let index: HashMap<String, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), i))
            .collect();

        let lookup = |name: &str| index.get(name).copied();
        for slot in &mut slots {
            slot.module.link(&lookup);
        }

        for missing in patch.unknown_outputs() {
            tracing::warn!(module = missing, "output names an unknown module");
        }
        let bus: Vec<usize> = patch
            .out
            .iter()
            .filter_map(|name| index.get(name).copied())
            .collect();

        let configured_volume = AMPLITUDE.clamp(patch.vol);
        tracing::info!(
            name = patch.name.as_deref().unwrap_or("untitled"),
            modules = slots.len(),
            outputs = bus.len(),
            sample_rate,
            "synth graph built"
        );

        Ok(Self {
            name: patch.name.clone(),
            sample_rate,
            signals: Signals::with_len(slots.len()),
            slots,
            index,
            bus,
            volume: Fader::new(configured_volume),
            configured_volume,
            glide: patch.glide.max(0.0),
            samples: 0,
        })
    }

    /// Compute one sample of the master output.
    pub fn next(&mut self) -> Output {
        let time = self.time();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let ctx = StepContext {
                signals: &self.signals,
                time,
                sample_rate: self.sample_rate,
            };
            let output = slot.module.step(&ctx);
            self.signals
                .record(i, output, slot.module.curve(), self.sample_rate);
        }

        let mix = self
            .bus
            .iter()
            .fold(Output::SILENT, |acc, &i| acc + self.signals.output(i));
        self.samples += 1;
        mix.scaled(self.volume.advance())
    }

    /// Build a graph from `patch` and splice it in.
    ///
    /// # Errors
    ///
    /// Any construction error from [`SynthGraph::new`]; the live graph is
    /// left untouched.
    pub fn load_synth(&mut self, patch: &Patch) -> Result<SpliceReport, SynthError> {
        let mut fresh = SynthGraph::new(patch, self.sample_rate)?;
        let report = self.splice(&mut fresh);
        tracing::info!(
            retained = report.retained,
            added = report.added,
            removed = report.removed,
            "synth reloaded"
        );
        Ok(report)
    }

    /// Replace this graph's definition with `fresh`, keeping the live
    /// instance of every module whose name and kind survive.
    ///
    /// The sample clock carries over and the master volume glides to the
    /// fresh configured volume. On return `fresh` holds the previous graph
    /// (dropped modules and leftover configuration).
    ///
    /// Apart from growing a delay buffer nothing here allocates or frees.
    /// Dropping the previous graph does, so real-time callers should hand it
    /// off to another thread.
    pub fn splice(&mut self, fresh: &mut SynthGraph) -> SpliceReport {
        let glide = Glide {
            seconds: fresh.glide,
            sample_rate: fresh.sample_rate,
        };
        let mut report = SpliceReport::default();

        for (i, slot) in fresh.slots.iter_mut().enumerate() {
            let Some(&old) = self.index.get(&slot.name) else {
                report.added += 1;
                continue;
            };
            let live = &mut self.slots[old].module;
            if live.kind() != slot.module.kind() {
                report.added += 1;
                continue;
            }

            // The live instance moves into the fresh slot and takes the
            // fresh configuration, which is left behind in the old slot.
            std::mem::swap(live, &mut slot.module);
            slot.module.update(live, glide);
            fresh.signals.restore(
                i,
                self.signals.output(old),
                self.signals.integral(old),
                self.signals.curve(old),
            );
            report.retained += 1;
        }
        report.removed = self.slots.len() - report.retained;

        fresh.samples = self.samples;
        std::mem::swap(&mut fresh.volume, &mut self.volume);
        fresh
            .volume
            .fade_to(fresh.configured_volume, glide.seconds, glide.sample_rate);

        std::mem::swap(self, fresh);
        report
    }

    /// Display name from the patch.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Module registered as `name`.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index.get(name).map(|&i| &self.slots[i].module)
    }

    /// Kind of the module registered as `name`.
    pub fn kind_of(&self, name: &str) -> Option<ModuleKind> {
        self.module(name).map(Module::kind)
    }

    /// Latest output of `name`.
    pub fn output(&self, name: &str) -> Option<Output> {
        self.index.get(name).map(|&i| self.signals.output(i))
    }

    /// Running time-integral of `name`.
    pub fn integral(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.signals.integral(i))
    }

    /// Module names in evaluation order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Seconds of audio produced so far.
    pub fn time(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.samples as f64 / f64::from(self.sample_rate)
        } else {
            0.0
        }
    }

    /// Samples produced so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Hot-swap glide in seconds.
    pub fn glide(&self) -> f32 {
        self.glide
    }

    /// Current master volume.
    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Ramp the master volume to `target` over `seconds`.
    pub fn set_volume(&mut self, target: f32, seconds: f32) {
        self.volume
            .fade_to(AMPLITUDE.clamp(target), seconds, self.sample_rate);
    }

    /// Jump the master volume to `value`.
    pub fn set_volume_immediate(&mut self, value: f32) {
        self.volume.set_immediate(AMPLITUDE.clamp(value));
    }

    /// True once the master volume has reached its target.
    pub fn is_volume_settled(&self) -> bool {
        self.volume.is_settled()
    }

    /// Master volume declared by the patch.
    pub fn configured_volume(&self) -> f32 {
        self.configured_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::{OscillatorDef, ParamDef, WaveType};

    fn square(freq: f32) -> OscillatorDef {
        OscillatorDef {
            wave: WaveType::Square,
            freq: ParamDef::value(freq),
            ..OscillatorDef::default()
        }
    }

    #[test]
    fn slots_follow_evaluation_order() {
        let patch = Patch::from_toml(
            r#"
            [mixers.m]
            [oscillators.b]
            [oscillators.a]
            [gates.g]
            [delays.d]
            "#,
        )
        .unwrap();
        let graph = SynthGraph::new(&patch, 48000.0).unwrap();
        assert_eq!(graph.module_names().collect::<Vec<_>>(), ["g", "a", "b", "m", "d"]);
    }

    #[test]
    fn bus_sums_and_skips_unknown_outputs() {
        let mut patch = Patch::new().with_output("a").with_output("b").with_output("ghost");
        patch.oscillators.insert("a".into(), square(0.0));
        patch.oscillators.insert("b".into(), square(0.0));
        let mut graph = SynthGraph::new(&patch, 4.0).unwrap();
        assert_eq!(graph.next(), Output::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn master_volume_scales_output() {
        let mut patch = Patch::new().with_output("a").with_volume(0.5);
        patch.oscillators.insert("a".into(), square(0.0));
        let mut graph = SynthGraph::new(&patch, 4.0).unwrap();
        assert_eq!(graph.configured_volume(), 0.5);
        assert_eq!(graph.next().mono, 0.5);
    }

    #[test]
    fn later_slots_are_read_one_sample_late() {
        // "a" is stepped before "b": a reads b's previous value, b reads a's current one.
        let patch = Patch::from_toml(
            r#"
            [oscillators.src]
            type = "square"
            freq = 0
            [mixers.a.inputs]
            b = 1
            [mixers.b.inputs]
            src = 1
            "#,
        )
        .unwrap();
        let mut graph = SynthGraph::new(&patch, 4.0).unwrap();
        graph.next();
        assert_eq!(graph.output("b").unwrap().mono, 1.0);
        assert_eq!(graph.output("a").unwrap().mono, 0.0);
        graph.next();
        assert_eq!(graph.output("a").unwrap().mono, 1.0);
    }

    #[test]
    fn failed_load_leaves_graph_untouched() {
        let mut patch = Patch::new().with_output("a");
        patch.oscillators.insert("a".into(), square(1.0));
        let mut graph = SynthGraph::new(&patch, 4.0).unwrap();
        graph.next();

        let bad = Patch::from_toml("[sequencers.s]\nsequence = [\"x_4\"]\n").unwrap();
        assert!(matches!(
            graph.load_synth(&bad),
            Err(SynthError::InvalidNote { .. })
        ));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.samples(), 1);
    }

    #[test]
    fn kind_change_rebuilds_module() {
        let mut patch = Patch::new();
        patch.oscillators.insert("x".into(), square(1.0));
        let mut graph = SynthGraph::new(&patch, 4.0).unwrap();

        let mut next = Patch::new();
        next.noises.insert("x".into(), Default::default());
        let report = graph.load_synth(&next).unwrap();

        assert_eq!(report, SpliceReport { retained: 0, added: 1, removed: 1 });
        assert_eq!(graph.kind_of("x"), Some(ModuleKind::Noise));
    }
}
