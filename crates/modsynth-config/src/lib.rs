//! Patch documents for modsynth.
//!
//! A patch declares the modules of a synth graph, how they modulate each
//! other, and which of them reach the output bus. This crate defines the
//! document schema, loads and saves it as TOML or JSON, and validates it
//! before a graph is built.
//!
//! # Features
//!
//! - **Patch schema**: [`Patch`] with one named collection per module kind
//! - **Modulatable values**: [`ParamDef`], a bare number or `{ val, mod, modamp }`
//! - **Formats**: TOML by default, JSON by `.json` extension
//! - **Validation**: unique, well-formed names and finite values
//!
//! # Example
//!
//! ```rust
//! use modsynth_config::{Patch, ModuleKind};
//!
//! let patch = Patch::from_toml(r#"
//! vol = 0.8
//! out = ["tone"]
//!
//! [oscillators.tone]
//! type = "sine"
//! freq = 220
//! amp = { val = 0.5, mod = ["wobble"], modamp = 0.2 }
//!
//! [oscillators.wobble]
//! freq = 3
//! "#).unwrap();
//!
//! patch.validate().unwrap();
//! assert_eq!(patch.kind_of("tone"), Some(ModuleKind::Oscillator));
//! ```

mod error;
mod module_def;
mod param_def;
mod patch;

/// Patch validation.
pub mod validation;

pub use error::ConfigError;
pub use module_def::{
    DelayDef, EnvelopeDef, FilterDef, GateDef, MixerDef, ModuleKind, NoiseDef, NumericFields,
    OscillatorDef, PanDef, PartialDef, SamplerDef, SequencerDef, SignalDef, TextDef, WaveType,
    WavetableDef,
};
pub use param_def::ParamDef;
pub use patch::{ModuleDef, Patch, PatchFormat};
pub use validation::{ValidationError, ValidationResult, validate_name, validate_patch};
