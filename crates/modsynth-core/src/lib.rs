//! Modsynth Core - primitives for a per-sample modular synthesizer
//!
//! This crate holds the pieces every module in a modsynth graph is built from.
//! Nothing here allocates on the per-sample path.
//!
//! # Core Abstractions
//!
//! ## Signal Values
//!
//! - [`Output`] - One sample of a module's output as `{mono, left, right}`
//! - [`Signals`] - Per-pass snapshot of every module's latest output and running integral
//!
//! ## Parameters
//!
//! - [`Range`] and the constants in [`range`] - Domain clamp intervals
//! - [`Fader`] - Linear ramp for values that must glide rather than step
//! - [`Param`] - Modulatable scalar resolved from a base value plus named sources
//!
//! ## DSP Primitives
//!
//! - [`Waveform`], [`Phase`], [`NoiseGen`] - Phase-accumulator signal functions
//! - [`Comb`] - Resizable feedback comb filter
//! - [`BandCurve`] - Band-pass gain curve used as a frequency mask
//! - [`samples_per_beat`] - Tempo conversion for clocked modules
//! - [`note_to_freq`] - Note-name parsing for sequencers
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! modsynth-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use modsynth_core::{Output, Phase, Waveform, NoiseGen};
//!
//! let mut phase = Phase::default();
//! let mut noise = NoiseGen::default();
//!
//! let samples: Vec<Output> = (0..4)
//!     .map(|_| {
//!         let x = Waveform::Sine.sample(phase.get(), &mut noise);
//!         phase.advance(1.0, 4.0);
//!         Output::panned(x, 0.0)
//!     })
//!     .collect();
//!
//! assert!((samples[1].mono - 1.0).abs() < 1e-6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod band;
pub mod comb;
pub mod fader;
pub mod note;
pub mod output;
pub mod param;
pub mod range;
pub mod signal;
pub mod signals;
pub mod tempo;

// Re-export main types at crate root
pub use band::BandCurve;
pub use comb::{Comb, delay_samples};
pub use fader::Fader;
pub use note::{MAX_OCTAVE, MIN_OCTAVE, Note, NoteError, note_to_freq, parse_note};
pub use output::Output;
pub use param::Param;
pub use range::Range;
pub use signal::{NoiseGen, Phase, Waveform, normalize, text_to_table, to_clock, wrap_phase};
pub use signals::Signals;
pub use tempo::{beats_per_sample, samples_per_beat};
