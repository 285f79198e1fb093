//! Modsynth Synth - the running side of a modular synth patch
//!
//! A [`Patch`](modsynth_config::Patch) declares named modules; this crate
//! turns it into a [`SynthGraph`] that produces one stereo sample per call,
//! swaps in edited patches without clicks, and drives start/stop/reload
//! from another thread.
//!
//! # Core Components
//!
//! ## Modules
//!
//! The closed set of module kinds lives in [`modules`]:
//!
//! - [`Oscillator`], [`Wavetable`], [`TableOscillator`], [`Noise`] - sources
//! - [`Envelope`], [`Gate`], [`Sequencer`] - control shapes and clocks
//! - [`Filter`] - band curves applied to oscillator partials
//! - [`Mixer`], [`Pan`], [`Sampler`], [`Delay`] - processors
//!
//! ## Graph
//!
//! - [`SynthGraph`] - evaluates every module once per sample and sums the
//!   output bus under the master volume
//! - [`SpliceReport`] - what a hot-swap kept, added, and dropped
//!
//! ```rust
//! use modsynth_config::Patch;
//! use modsynth_synth::SynthGraph;
//!
//! let patch = Patch::from_toml(r#"
//! out = ["lfo_tone"]
//! [oscillators.lfo]
//! freq = 2
//! [oscillators.lfo_tone]
//! freq = { val = 440, mod = ["lfo"], modamp = 20 }
//! "#).unwrap();
//!
//! let mut graph = SynthGraph::new(&patch, 48000.0).unwrap();
//! let block: Vec<f32> = (0..64).map(|_| graph.next().mono).collect();
//! assert!(block.iter().all(|x| x.abs() <= 1.0));
//! ```
//!
//! ## Control
//!
//! - [`Controller`] - producer-side fade state machine around a graph
//! - [`ControlHandle`] - control-side commands and notifications
//!
//! # Threading
//!
//! The graph is single-threaded and owned by whoever produces samples.
//! Patches are parsed and graphs are built on the control thread; the
//! producer only receives finished graphs over a channel.

pub mod control;
pub mod error;
pub mod graph;
pub mod modules;

pub use control::{
    Command, ControlHandle, Controller, EngineConfig, FadeReason, Notification, PlayState,
};
pub use error::SynthError;
pub use graph::{SpliceReport, SynthGraph};
pub use modules::{
    Delay, Envelope, EnvelopeShape, EnvelopeStage, Filter, Gate, Mixer, Module, Noise, Oscillator,
    Pan, Partial, Sampler, Sequencer, TableOscillator, Wavetable,
};
