//! Patch document format and operations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::ConfigError;
use crate::module_def::{
    DelayDef, EnvelopeDef, FilterDef, GateDef, MixerDef, ModuleKind, NoiseDef, NumericFields,
    OscillatorDef, PanDef, SamplerDef, SequencerDef, SignalDef, TextDef, WavetableDef,
};

/// On-disk encoding of a patch, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    /// `.toml`, or no extension
    Toml,
    /// `.json`
    Json,
}

impl PatchFormat {
    /// Pick the format for `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(PatchFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(PatchFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(PatchFormat::Json),
            Some(_) => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Declarative synth definition.
///
/// A patch names every module once, groups modules by kind, and lists which
/// of them feed the master bus. It is never evaluated itself; a synth graph
/// is built from it and hot-swapped to newer versions of it.
///
/// # TOML Format
///
/// ```toml
/// name = "drone"
/// vol = 0.5
/// out = ["lead", "echo"]
///
/// [oscillators.lfo]
/// freq = 0.5
///
/// [oscillators.lead]
/// type = "triangle"
/// freq = { val = 220, mod = ["lfo"], modamp = 3 }
///
/// [delays.echo]
/// inputs = ["lead"]
/// time = 0.375
/// mix = 0.4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Master volume.
    #[serde(default = "default_volume")]
    pub vol: f32,

    /// Modules summed into the master output.
    #[serde(default)]
    pub out: Vec<String>,

    /// Seconds over which changed values glide on hot-swap.
    #[serde(default = "default_glide")]
    pub glide: f32,

    /// Multi-partial oscillators.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub oscillators: BTreeMap<String, OscillatorDef>,
    /// Noise generators.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub noises: BTreeMap<String, NoiseDef>,
    /// Table players with integral frequency modulation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wavetables: BTreeMap<String, WavetableDef>,
    /// User sample tables played as oscillators.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signals: BTreeMap<String, SignalDef>,
    /// Text played as an oscillator.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub texts: BTreeMap<String, TextDef>,
    /// Triggered envelopes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub envelopes: BTreeMap<String, EnvelopeDef>,
    /// Band-pass frequency masks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, FilterDef>,
    /// Clock gates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gates: BTreeMap<String, GateDef>,
    /// Feedback comb delays.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub delays: BTreeMap<String, DelayDef>,
    /// Weighted mixers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mixers: BTreeMap<String, MixerDef>,
    /// Re-panners.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pans: BTreeMap<String, PanDef>,
    /// Sample-and-hold units.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub samplers: BTreeMap<String, SamplerDef>,
    /// Note sequencers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sequencers: BTreeMap<String, SequencerDef>,
}

fn default_volume() -> f32 {
    1.0
}

fn default_glide() -> f32 {
    0.05
}

/// Borrowed view of one module declaration.
#[derive(Debug, Clone, Copy)]
pub enum ModuleDef<'a> {
    /// See [`OscillatorDef`].
    Oscillator(&'a OscillatorDef),
    /// See [`NoiseDef`].
    Noise(&'a NoiseDef),
    /// See [`WavetableDef`].
    Wavetable(&'a WavetableDef),
    /// See [`SignalDef`].
    CustomSignal(&'a SignalDef),
    /// See [`TextDef`].
    TextProcessor(&'a TextDef),
    /// See [`EnvelopeDef`].
    Envelope(&'a EnvelopeDef),
    /// See [`FilterDef`].
    Filter(&'a FilterDef),
    /// See [`GateDef`].
    Gate(&'a GateDef),
    /// See [`DelayDef`].
    Delay(&'a DelayDef),
    /// See [`MixerDef`].
    Mixer(&'a MixerDef),
    /// See [`PanDef`].
    Pan(&'a PanDef),
    /// See [`SamplerDef`].
    Sampler(&'a SamplerDef),
    /// See [`SequencerDef`].
    Sequencer(&'a SequencerDef),
}

impl ModuleDef<'_> {
    /// Kind of the declared module.
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleDef::Oscillator(_) => ModuleKind::Oscillator,
            ModuleDef::Noise(_) => ModuleKind::Noise,
            ModuleDef::Wavetable(_) => ModuleKind::Wavetable,
            ModuleDef::CustomSignal(_) => ModuleKind::CustomSignal,
            ModuleDef::TextProcessor(_) => ModuleKind::TextProcessor,
            ModuleDef::Envelope(_) => ModuleKind::Envelope,
            ModuleDef::Filter(_) => ModuleKind::Filter,
            ModuleDef::Gate(_) => ModuleKind::Gate,
            ModuleDef::Delay(_) => ModuleKind::Delay,
            ModuleDef::Mixer(_) => ModuleKind::Mixer,
            ModuleDef::Pan(_) => ModuleKind::Pan,
            ModuleDef::Sampler(_) => ModuleKind::Sampler,
            ModuleDef::Sequencer(_) => ModuleKind::Sequencer,
        }
    }

    /// Numeric fields of the declaration.
    pub fn numbers(&self) -> &dyn NumericFields {
        match self {
            ModuleDef::Oscillator(d) => *d,
            ModuleDef::Noise(d) => *d,
            ModuleDef::Wavetable(d) => *d,
            ModuleDef::CustomSignal(d) => *d,
            ModuleDef::TextProcessor(d) => *d,
            ModuleDef::Envelope(d) => *d,
            ModuleDef::Filter(d) => *d,
            ModuleDef::Gate(d) => *d,
            ModuleDef::Delay(d) => *d,
            ModuleDef::Mixer(d) => *d,
            ModuleDef::Pan(d) => *d,
            ModuleDef::Sampler(d) => *d,
            ModuleDef::Sequencer(d) => *d,
        }
    }
}

impl Patch {
    /// Create an empty patch at full volume.
    pub fn new() -> Self {
        Self {
            name: None,
            vol: default_volume(),
            out: Vec::new(),
            glide: default_glide(),
            oscillators: BTreeMap::new(),
            noises: BTreeMap::new(),
            wavetables: BTreeMap::new(),
            signals: BTreeMap::new(),
            texts: BTreeMap::new(),
            envelopes: BTreeMap::new(),
            filters: BTreeMap::new(),
            gates: BTreeMap::new(),
            delays: BTreeMap::new(),
            mixers: BTreeMap::new(),
            pans: BTreeMap::new(),
            samplers: BTreeMap::new(),
            sequencers: BTreeMap::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the master volume.
    pub fn with_volume(mut self, vol: f32) -> Self {
        self.vol = vol;
        self
    }

    /// Add a module to the output bus.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.out.push(name.into());
        self
    }

    /// Load a patch from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = PatchFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        match format {
            PatchFormat::Toml => Self::from_toml(&content),
            PatchFormat::Json => Self::from_json(&content),
        }
    }

    /// Parse a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Parse a patch from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Save the patch, encoding by file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match PatchFormat::from_path(path)? {
            PatchFormat::Toml => self.to_toml()?,
            PatchFormat::Json => self.to_json()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convert the patch to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names and values; see [`validate_patch`](crate::validate_patch).
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::validation::validate_patch(self)?;
        Ok(())
    }

    /// Every declaration, grouped by kind in evaluation order and by name
    /// within a kind. Duplicate names across kinds are all reported.
    pub fn modules(&self) -> Vec<(&str, ModuleDef<'_>)> {
        fn push<'a, D>(
            out: &mut Vec<(&'a str, ModuleDef<'a>)>,
            map: &'a BTreeMap<String, D>,
            wrap: fn(&'a D) -> ModuleDef<'a>,
        ) {
            out.extend(map.iter().map(|(name, def)| (name.as_str(), wrap(def))));
        }

        let mut out = Vec::with_capacity(self.len());
        push(&mut out, &self.gates, ModuleDef::Gate);
        push(&mut out, &self.sequencers, ModuleDef::Sequencer);
        push(&mut out, &self.samplers, ModuleDef::Sampler);
        push(&mut out, &self.envelopes, ModuleDef::Envelope);
        push(&mut out, &self.filters, ModuleDef::Filter);
        push(&mut out, &self.noises, ModuleDef::Noise);
        push(&mut out, &self.oscillators, ModuleDef::Oscillator);
        push(&mut out, &self.wavetables, ModuleDef::Wavetable);
        push(&mut out, &self.signals, ModuleDef::CustomSignal);
        push(&mut out, &self.texts, ModuleDef::TextProcessor);
        push(&mut out, &self.mixers, ModuleDef::Mixer);
        push(&mut out, &self.pans, ModuleDef::Pan);
        push(&mut out, &self.delays, ModuleDef::Delay);
        out
    }

    /// Names of all declared modules, in evaluation order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules().into_iter().map(|(name, _)| name).collect()
    }

    /// Kind of the module declared as `name`.
    pub fn kind_of(&self, name: &str) -> Option<ModuleKind> {
        self.modules()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, def)| def.kind())
    }

    /// Output bus entries that name no declared module.
    pub fn unknown_outputs(&self) -> Vec<&str> {
        let declared: BTreeSet<&str> = self.module_names().into_iter().collect();
        self.out
            .iter()
            .map(String::as_str)
            .filter(|name| !declared.contains(name))
            .collect()
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.oscillators.len()
            + self.noises.len()
            + self.wavetables.len()
            + self.signals.len()
            + self.texts.len()
            + self.envelopes.len()
            + self.filters.len()
            + self.gates.len()
            + self.delays.len()
            + self.mixers.len()
            + self.pans.len()
            + self.samplers.len()
            + self.sequencers.len()
    }

    /// True if no modules are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_def::WaveType;
    use crate::param_def::ParamDef;

    const DEMO: &str = r#"
name = "demo"
vol = 0.5
out = ["lead", "echo"]

[oscillators.lfo]
freq = 0.5

[oscillators.lead]
type = "triangle"
freq = { val = 220, mod = ["lfo"], modamp = 3 }
partials = [{ ratio = 1 }, { ratio = 2, amp = 0.5 }]

[delays.echo]
inputs = ["lead"]
time = 0.375
mix = 0.4

[gates.clock]
signal = [1, 0, 1, 1]
bpm = 90
"#;

    #[test]
    fn test_patch_from_toml() {
        let patch = Patch::from_toml(DEMO).unwrap();
        assert_eq!(patch.name.as_deref(), Some("demo"));
        assert_eq!(patch.vol, 0.5);
        assert_eq!(patch.glide, 0.05);
        assert_eq!(patch.out, vec!["lead", "echo"]);
        assert_eq!(patch.len(), 4);

        let lead = &patch.oscillators["lead"];
        assert_eq!(lead.wave, WaveType::Triangle);
        assert_eq!(lead.freq, ParamDef::value(220.0).modulated(["lfo"], 3.0));
        assert_eq!(lead.partials.len(), 2);

        assert_eq!(patch.delays["echo"].time, 0.375);
        assert_eq!(patch.gates["clock"].bpm.val, 90.0);
    }

    #[test]
    fn test_minimal_toml() {
        let patch = Patch::from_toml("").unwrap();
        assert_eq!(patch, Patch::default());
        assert!(patch.is_empty());
        assert_eq!(patch.vol, 1.0);
    }

    #[test]
    fn test_patch_roundtrip() {
        let original = Patch::from_toml(DEMO).unwrap();
        let toml = original.to_toml().unwrap();
        assert_eq!(Patch::from_toml(&toml).unwrap(), original);

        let json = original.to_json().unwrap();
        assert_eq!(Patch::from_json(&json).unwrap(), original);
    }

    #[test]
    fn modules_follow_evaluation_order() {
        let patch = Patch::from_toml(DEMO).unwrap();
        assert_eq!(patch.module_names(), vec!["clock", "lead", "lfo", "echo"]);
        assert_eq!(patch.kind_of("echo"), Some(ModuleKind::Delay));
        assert_eq!(patch.kind_of("nope"), None);
    }

    #[test]
    fn unknown_outputs_are_listed() {
        let patch = Patch::from_toml(DEMO).unwrap().with_output("ghost");
        assert_eq!(patch.unknown_outputs(), vec!["ghost"]);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(PatchFormat::from_path(Path::new("a.toml")).unwrap(), PatchFormat::Toml);
        assert_eq!(PatchFormat::from_path(Path::new("a.JSON")).unwrap(), PatchFormat::Json);
        assert_eq!(PatchFormat::from_path(Path::new("patch")).unwrap(), PatchFormat::Toml);
        assert!(matches!(
            PatchFormat::from_path(Path::new("a.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn builder() {
        let patch = Patch::new().with_name("x").with_volume(0.3).with_output("a");
        assert_eq!(patch.name.as_deref(), Some("x"));
        assert_eq!(patch.vol, 0.3);
        assert_eq!(patch.out, vec!["a"]);
    }
}
