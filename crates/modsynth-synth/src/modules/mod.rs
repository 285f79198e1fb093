//! The closed set of module kinds.
//!
//! Each kind lives in its own file and follows the same contract:
//!
//! - `from_def` builds and initializes the module from its declaration
//!   (normalizing tables, sizing buffers, parsing notes)
//! - `link` resolves every referenced module name to a slot index
//! - `step` produces one [`Output`] from the current [`StepContext`]
//! - `update` adopts the configuration of a freshly built instance while
//!   keeping run-time state (phase, buffers, trigger state)
//!
//! [`Module`] dispatches over the kinds with a plain `match`.

mod delay;
mod envelope;
mod filter;
mod gate;
mod mixer;
mod noise;
mod oscillator;
mod pan;
mod sampler;
mod sequencer;
mod table;
mod wavetable;

pub use delay::Delay;
pub use envelope::{Envelope, EnvelopeShape, EnvelopeStage};
pub use filter::Filter;
pub use gate::Gate;
pub use mixer::Mixer;
pub use noise::Noise;
pub use oscillator::{Oscillator, Partial};
pub use pan::Pan;
pub use sampler::Sampler;
pub use sequencer::Sequencer;
pub use table::TableOscillator;
pub use wavetable::Wavetable;

use modsynth_config::{ModuleDef, ModuleKind};
use modsynth_core::{BandCurve, Output, Param, Signals};

use crate::error::SynthError;

/// Maps a module name to its slot index in the graph.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<usize>;

/// Everything a module may read while computing one sample.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Latest outputs of every slot (current pass for earlier slots,
    /// previous pass for this and later slots).
    pub signals: &'a Signals,
    /// Seconds since the graph started.
    pub time: f64,
    /// Samples per second.
    pub sample_rate: f32,
}

/// Values available while building a module.
#[derive(Clone, Copy, Debug)]
pub struct BuildContext<'a> {
    /// Module name, used in errors and to derive default seeds.
    pub name: &'a str,
    /// Samples per second.
    pub sample_rate: f32,
}

impl BuildContext<'_> {
    /// Stable seed derived from the module name (FNV-1a).
    pub fn name_seed(&self) -> u32 {
        self.name.bytes().fold(0x811c_9dc5u32, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
    }
}

/// How parameter changes are smoothed during a hot-swap.
#[derive(Clone, Copy, Debug)]
pub struct Glide {
    /// Glide duration in seconds.
    pub seconds: f32,
    /// Samples per second.
    pub sample_rate: f32,
}

impl Glide {
    /// Move `fresh`'s configuration into `live`, gliding the base value.
    #[inline]
    pub fn param(&self, live: &mut Param, fresh: &mut Param) {
        live.update(fresh, self.seconds, self.sample_rate);
    }
}

/// A list of referenced module names and the slots they resolved to.
///
/// Names that do not exist in the graph are dropped at link time and read
/// as silence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sources {
    names: Vec<String>,
    links: Vec<usize>,
}

impl Sources {
    /// Create an unlinked list.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            links: Vec::new(),
        }
    }

    /// Create from an optional single name.
    pub fn single(name: Option<&str>) -> Self {
        Self::new(name.filter(|n| !n.is_empty()))
    }

    /// Resolve names to slot indices.
    pub fn link(&mut self, lookup: Lookup<'_>) {
        self.links = self.names.iter().filter_map(|name| lookup(name.as_str())).collect();
    }

    /// True if at least one name resolved.
    #[inline]
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    /// Sum of the linked mono outputs.
    #[inline]
    pub fn mono(&self, signals: &Signals) -> f32 {
        self.links.iter().map(|&i| signals.output(i).mono).sum()
    }

    /// Sum of the linked outputs, channel by channel.
    #[inline]
    pub fn output(&self, signals: &Signals) -> Output {
        self.links
            .iter()
            .fold(Output::SILENT, |acc, &i| acc + signals.output(i))
    }

    /// Band curves published by the linked slots.
    #[inline]
    pub fn curves<'s>(&'s self, signals: &'s Signals) -> impl Iterator<Item = BandCurve> + 's {
        self.links.iter().filter_map(move |&i| signals.curve(i))
    }

    /// Declared names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolved slot indices.
    pub fn links(&self) -> &[usize] {
        &self.links
    }

    /// Move `fresh`'s names and links into `self`.
    pub fn update(&mut self, fresh: &mut Sources) {
        std::mem::swap(self, fresh);
    }
}

/// Rising-edge detector: fires when a value goes from `<= 0` to `> 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RisingEdge {
    previous: f32,
}

impl RisingEdge {
    /// Feed the next value; true on a rising edge.
    #[inline]
    pub fn detect(&mut self, value: f32) -> bool {
        let fired = self.previous <= 0.0 && value > 0.0;
        self.previous = value;
        fired
    }
}

/// One module of any kind.
#[derive(Debug, Clone)]
pub enum Module {
    /// See [`Gate`].
    Gate(Gate),
    /// See [`Sequencer`].
    Sequencer(Sequencer),
    /// See [`Sampler`].
    Sampler(Sampler),
    /// See [`Envelope`].
    Envelope(Envelope),
    /// See [`Filter`].
    Filter(Filter),
    /// See [`Noise`].
    Noise(Noise),
    /// See [`Oscillator`].
    Oscillator(Oscillator),
    /// See [`Wavetable`].
    Wavetable(Wavetable),
    /// User sample table; see [`TableOscillator`].
    CustomSignal(TableOscillator),
    /// Text bytes as a table; see [`TableOscillator`].
    TextProcessor(TableOscillator),
    /// See [`Mixer`].
    Mixer(Mixer),
    /// See [`Pan`].
    Pan(Pan),
    /// See [`Delay`].
    Delay(Delay),
}

impl Module {
    /// Build and initialize a module from its declaration.
    pub fn from_def(def: ModuleDef<'_>, ctx: &BuildContext<'_>) -> Result<Self, SynthError> {
        let module = match def {
            ModuleDef::Gate(d) => Module::Gate(Gate::from_def(d, ctx)),
            ModuleDef::Sequencer(d) => Module::Sequencer(Sequencer::from_def(d, ctx)?),
            ModuleDef::Sampler(d) => Module::Sampler(Sampler::from_def(d, ctx)),
            ModuleDef::Envelope(d) => Module::Envelope(Envelope::from_def(d, ctx)),
            ModuleDef::Filter(d) => Module::Filter(Filter::from_def(d, ctx)),
            ModuleDef::Noise(d) => Module::Noise(Noise::from_def(d, ctx)),
            ModuleDef::Oscillator(d) => Module::Oscillator(Oscillator::from_def(d, ctx)),
            ModuleDef::Wavetable(d) => Module::Wavetable(Wavetable::from_def(d, ctx)),
            ModuleDef::CustomSignal(d) => {
                Module::CustomSignal(TableOscillator::from_signal(d, ctx))
            }
            ModuleDef::TextProcessor(d) => Module::TextProcessor(TableOscillator::from_text(d, ctx)),
            ModuleDef::Mixer(d) => Module::Mixer(Mixer::from_def(d, ctx)),
            ModuleDef::Pan(d) => Module::Pan(Pan::from_def(d, ctx)),
            ModuleDef::Delay(d) => Module::Delay(Delay::from_def(d, ctx)),
        };
        Ok(module)
    }

    /// Kind of this module.
    pub fn kind(&self) -> ModuleKind {
        match self {
            Module::Gate(_) => ModuleKind::Gate,
            Module::Sequencer(_) => ModuleKind::Sequencer,
            Module::Sampler(_) => ModuleKind::Sampler,
            Module::Envelope(_) => ModuleKind::Envelope,
            Module::Filter(_) => ModuleKind::Filter,
            Module::Noise(_) => ModuleKind::Noise,
            Module::Oscillator(_) => ModuleKind::Oscillator,
            Module::Wavetable(_) => ModuleKind::Wavetable,
            Module::CustomSignal(_) => ModuleKind::CustomSignal,
            Module::TextProcessor(_) => ModuleKind::TextProcessor,
            Module::Mixer(_) => ModuleKind::Mixer,
            Module::Pan(_) => ModuleKind::Pan,
            Module::Delay(_) => ModuleKind::Delay,
        }
    }

    /// Resolve every referenced name to a slot index.
    pub fn link(&mut self, lookup: Lookup<'_>) {
        match self {
            Module::Gate(m) => m.link(lookup),
            Module::Sequencer(m) => m.link(lookup),
            Module::Sampler(m) => m.link(lookup),
            Module::Envelope(m) => m.link(lookup),
            Module::Filter(m) => m.link(lookup),
            Module::Noise(m) => m.link(lookup),
            Module::Oscillator(m) => m.link(lookup),
            Module::Wavetable(m) => m.link(lookup),
            Module::CustomSignal(m) | Module::TextProcessor(m) => m.link(lookup),
            Module::Mixer(m) => m.link(lookup),
            Module::Pan(m) => m.link(lookup),
            Module::Delay(m) => m.link(lookup),
        }
    }

    /// Compute one sample.
    #[inline]
    pub fn step(&mut self, ctx: &StepContext<'_>) -> Output {
        match self {
            Module::Gate(m) => m.step(ctx),
            Module::Sequencer(m) => m.step(ctx),
            Module::Sampler(m) => m.step(ctx),
            Module::Envelope(m) => m.step(ctx),
            Module::Filter(m) => m.step(ctx),
            Module::Noise(m) => m.step(ctx),
            Module::Oscillator(m) => m.step(ctx),
            Module::Wavetable(m) => m.step(ctx),
            Module::CustomSignal(m) | Module::TextProcessor(m) => m.step(ctx),
            Module::Mixer(m) => m.step(ctx),
            Module::Pan(m) => m.step(ctx),
            Module::Delay(m) => m.step(ctx),
        }
    }

    /// Band curve published by a filter; `None` for every other kind.
    #[inline]
    pub fn curve(&self) -> Option<BandCurve> {
        match self {
            Module::Filter(m) => Some(m.curve()),
            _ => None,
        }
    }

    /// Adopt `fresh`'s configuration, keeping this instance's run-time state.
    ///
    /// Returns false (and changes nothing) when the kinds differ.
    pub fn update(&mut self, fresh: &mut Module, glide: Glide) -> bool {
        match (self, fresh) {
            (Module::Gate(a), Module::Gate(b)) => a.update(b, glide),
            (Module::Sequencer(a), Module::Sequencer(b)) => a.update(b, glide),
            (Module::Sampler(a), Module::Sampler(b)) => a.update(b, glide),
            (Module::Envelope(a), Module::Envelope(b)) => a.update(b, glide),
            (Module::Filter(a), Module::Filter(b)) => a.update(b, glide),
            (Module::Noise(a), Module::Noise(b)) => a.update(b, glide),
            (Module::Oscillator(a), Module::Oscillator(b)) => a.update(b, glide),
            (Module::Wavetable(a), Module::Wavetable(b)) => a.update(b, glide),
            (Module::CustomSignal(a), Module::CustomSignal(b))
            | (Module::TextProcessor(a), Module::TextProcessor(b)) => a.update(b, glide),
            (Module::Mixer(a), Module::Mixer(b)) => a.update(b, glide),
            (Module::Pan(a), Module::Pan(b)) => a.update(b, glide),
            (Module::Delay(a), Module::Delay(b)) => a.update(b, glide),
            _ => return false,
        }
        true
    }
}
