//! Per-kind module declarations.
//!
//! Each struct is one entry of a patch collection, keyed by module name.
//! Every field has a default, so a patch only spells out what differs.

use std::collections::BTreeMap;
use std::fmt;

use modsynth_core::Waveform;
use serde::{Deserialize, Serialize};

use crate::param_def::ParamDef;

/// The closed set of module kinds.
///
/// Declaration order is evaluation order: within one pass the graph steps
/// every gate before any sequencer, every sequencer before any sampler, and
/// so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleKind {
    /// Clocked ±1 gate signal.
    Gate,
    /// Note sequencer emitting frequency as control voltage.
    Sequencer,
    /// Edge-triggered sample-and-hold.
    Sampler,
    /// Triggered ADSR shaper.
    Envelope,
    /// Band-pass frequency mask.
    Filter,
    /// White noise.
    Noise,
    /// Multi-partial oscillator.
    Oscillator,
    /// Table playback with integral frequency modulation.
    Wavetable,
    /// User sample table played as an oscillator.
    CustomSignal,
    /// Text bytes played as an oscillator.
    TextProcessor,
    /// Weighted sum of inputs.
    Mixer,
    /// Re-panner.
    Pan,
    /// Feedback comb delay.
    Delay,
}

impl ModuleKind {
    /// All kinds in evaluation order.
    pub const EVALUATION_ORDER: [ModuleKind; 13] = [
        ModuleKind::Gate,
        ModuleKind::Sequencer,
        ModuleKind::Sampler,
        ModuleKind::Envelope,
        ModuleKind::Filter,
        ModuleKind::Noise,
        ModuleKind::Oscillator,
        ModuleKind::Wavetable,
        ModuleKind::CustomSignal,
        ModuleKind::TextProcessor,
        ModuleKind::Mixer,
        ModuleKind::Pan,
        ModuleKind::Delay,
    ];

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::Gate => "gate",
            ModuleKind::Sequencer => "sequencer",
            ModuleKind::Sampler => "sampler",
            ModuleKind::Envelope => "envelope",
            ModuleKind::Filter => "filter",
            ModuleKind::Noise => "noise",
            ModuleKind::Oscillator => "oscillator",
            ModuleKind::Wavetable => "wavetable",
            ModuleKind::CustomSignal => "signal",
            ModuleKind::TextProcessor => "text",
            ModuleKind::Mixer => "mixer",
            ModuleKind::Pan => "pan",
            ModuleKind::Delay => "delay",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Oscillator waveform as written in a patch (`type = "sawtooth"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaveType {
    /// Sine.
    #[default]
    Sine,
    /// Square.
    Square,
    /// Triangle.
    Triangle,
    /// Rising ramp.
    #[serde(alias = "saw")]
    Sawtooth,
    /// Falling ramp.
    #[serde(alias = "reverse-saw")]
    ReverseSawtooth,
    /// White noise.
    Noise,
}

impl From<WaveType> for Waveform {
    fn from(wave: WaveType) -> Self {
        match wave {
            WaveType::Sine => Waveform::Sine,
            WaveType::Square => Waveform::Square,
            WaveType::Triangle => Waveform::Triangle,
            WaveType::Sawtooth => Waveform::Sawtooth,
            WaveType::ReverseSawtooth => Waveform::ReverseSawtooth,
            WaveType::Noise => Waveform::Noise,
        }
    }
}

fn one() -> f32 {
    1.0
}

fn unity() -> ParamDef {
    ParamDef::value(1.0)
}

fn half() -> ParamDef {
    ParamDef::value(0.5)
}

fn a440() -> ParamDef {
    ParamDef::value(440.0)
}

fn nyquist_ceiling() -> ParamDef {
    ParamDef::value(20000.0)
}

fn tempo() -> ParamDef {
    ParamDef::value(120.0)
}

fn concert_pitch() -> f32 {
    440.0
}

/// One partial of an oscillator: a frequency ratio with its own level and
/// phase offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialDef {
    /// Frequency multiple of the oscillator frequency.
    #[serde(default = "one")]
    pub ratio: f32,
    /// Partial level before averaging.
    #[serde(default = "one")]
    pub amp: f32,
    /// Phase offset in cycles.
    #[serde(default)]
    pub phase: f32,
}

impl Default for PartialDef {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            amp: 1.0,
            phase: 0.0,
        }
    }
}

/// `[oscillators.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorDef {
    /// Waveform.
    #[serde(rename = "type", default)]
    pub wave: WaveType,
    /// Frequency in Hz.
    #[serde(default = "a440")]
    pub freq: ParamDef,
    /// Control-voltage source that replaces the base frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    /// Output level.
    #[serde(default = "unity")]
    pub amp: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
    /// Phase offset in cycles; modulating it gives phase modulation.
    #[serde(default)]
    pub phase: ParamDef,
    /// Partials; empty means a single fundamental.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partials: Vec<PartialDef>,
    /// Filters whose band curves mask each partial by frequency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

impl Default for OscillatorDef {
    fn default() -> Self {
        Self {
            wave: WaveType::Sine,
            freq: a440(),
            cv: None,
            amp: unity(),
            pan: ParamDef::default(),
            phase: ParamDef::default(),
            partials: Vec::new(),
            filters: Vec::new(),
        }
    }
}

/// `[noises.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseDef {
    /// Output level.
    #[serde(default = "unity")]
    pub amp: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
    /// Generator seed; omitted means derived from the module name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl Default for NoiseDef {
    fn default() -> Self {
        Self {
            amp: unity(),
            pan: ParamDef::default(),
            seed: None,
        }
    }
}

/// `[wavetables.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavetableDef {
    /// Samples, normalized into [-1, 1] on load.
    #[serde(default)]
    pub signal: Vec<f32>,
    /// Table repetitions per second. Its modulation sources act through
    /// their running integrals.
    #[serde(default = "unity")]
    pub freq: ParamDef,
    /// Control-voltage source that replaces the base frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    /// Output level.
    #[serde(default = "unity")]
    pub amp: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
}

impl Default for WavetableDef {
    fn default() -> Self {
        Self {
            signal: Vec::new(),
            freq: unity(),
            cv: None,
            amp: unity(),
            pan: ParamDef::default(),
        }
    }
}

/// `[signals.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDef {
    /// One cycle of samples, normalized into [-1, 1] on load.
    #[serde(default)]
    pub signal: Vec<f32>,
    /// Cycles per second.
    #[serde(default = "unity")]
    pub freq: ParamDef,
    /// Control-voltage source that replaces the base frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    /// Output level.
    #[serde(default = "unity")]
    pub amp: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
    /// Phase offset in cycles.
    #[serde(default)]
    pub phase: ParamDef,
}

impl Default for SignalDef {
    fn default() -> Self {
        Self {
            signal: Vec::new(),
            freq: unity(),
            cv: None,
            amp: unity(),
            pan: ParamDef::default(),
            phase: ParamDef::default(),
        }
    }
}

/// `[texts.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDef {
    /// Text whose bytes form one cycle.
    #[serde(default)]
    pub text: String,
    /// Cycles per second.
    #[serde(default = "unity")]
    pub freq: ParamDef,
    /// Control-voltage source that replaces the base frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    /// Output level.
    #[serde(default = "unity")]
    pub amp: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
    /// Phase offset in cycles.
    #[serde(default)]
    pub phase: ParamDef,
}

impl Default for TextDef {
    fn default() -> Self {
        Self {
            text: String::new(),
            freq: unity(),
            cv: None,
            amp: unity(),
            pan: ParamDef::default(),
            phase: ParamDef::default(),
        }
    }
}

/// `[envelopes.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDef {
    /// Modules whose summed output triggers the envelope.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Level the trigger magnitude must rise through.
    #[serde(default = "half")]
    pub threshold: ParamDef,
    /// Attack time in seconds.
    #[serde(default)]
    pub attack: ParamDef,
    /// Decay time in seconds.
    #[serde(default)]
    pub decay: ParamDef,
    /// Sustain time in seconds.
    #[serde(default)]
    pub sustain: ParamDef,
    /// Release time in seconds.
    #[serde(default)]
    pub release: ParamDef,
    /// Level reached at the end of the attack.
    #[serde(default = "unity")]
    pub peak: ParamDef,
    /// Sustain level.
    #[serde(default = "unity")]
    pub level: ParamDef,
    /// Invert the output.
    #[serde(default)]
    pub negative: bool,
}

impl Default for EnvelopeDef {
    fn default() -> Self {
        Self {
            triggers: Vec::new(),
            threshold: half(),
            attack: ParamDef::default(),
            decay: ParamDef::default(),
            sustain: ParamDef::default(),
            release: ParamDef::default(),
            peak: unity(),
            level: unity(),
            negative: false,
        }
    }
}

/// `[filters.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    /// Lower pass-band edge in Hz.
    #[serde(default)]
    pub low: ParamDef,
    /// Upper pass-band edge in Hz.
    #[serde(default = "nyquist_ceiling")]
    pub high: ParamDef,
    /// Skirt width in Hz.
    #[serde(default)]
    pub ramp: ParamDef,
    /// Gain applied to the curve.
    #[serde(default = "unity")]
    pub volume: ParamDef,
}

impl Default for FilterDef {
    fn default() -> Self {
        Self {
            low: ParamDef::default(),
            high: nyquist_ceiling(),
            ramp: ParamDef::default(),
            volume: unity(),
        }
    }
}

/// `[gates.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDef {
    /// Clock pattern, one entry per beat; coerced to ±1 on load.
    #[serde(default)]
    pub signal: Vec<f32>,
    /// Beats per minute.
    #[serde(default = "tempo")]
    pub bpm: ParamDef,
    /// Control-voltage source that replaces the base tempo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
}

impl Default for GateDef {
    fn default() -> Self {
        Self {
            signal: Vec::new(),
            bpm: tempo(),
            cv: None,
        }
    }
}

/// `[delays.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayDef {
    /// Modules summed into the delay line.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Delay time in seconds; sizes the buffer.
    #[serde(default)]
    pub time: f32,
    /// Feedback mix.
    #[serde(default = "half")]
    pub mix: ParamDef,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
}

impl Default for DelayDef {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            time: 0.0,
            mix: half(),
            pan: ParamDef::default(),
        }
    }
}

/// `[mixers.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerDef {
    /// Input module name to weight.
    #[serde(default)]
    pub inputs: BTreeMap<String, ParamDef>,
    /// Output gain.
    #[serde(default = "unity")]
    pub gain: ParamDef,
}

impl Default for MixerDef {
    fn default() -> Self {
        Self {
            inputs: BTreeMap::new(),
            gain: unity(),
        }
    }
}

/// `[pans.<name>]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanDef {
    /// Module whose mono output is re-panned.
    #[serde(default)]
    pub input: String,
    /// Stereo position.
    #[serde(default)]
    pub pan: ParamDef,
}

/// `[samplers.<name>]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplerDef {
    /// Module whose output is sampled.
    #[serde(default)]
    pub input: String,
    /// Modules whose rising edge takes a sample.
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// `[sequencers.<name>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerDef {
    /// Note names such as `a_4` or `c#_5`.
    #[serde(default)]
    pub sequence: Vec<String>,
    /// Modules whose rising edge advances the sequence.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Frequency of `a_4`.
    #[serde(default = "concert_pitch")]
    pub pitch: f32,
    /// Semitone shift applied to every note.
    #[serde(default)]
    pub transpose: f32,
    /// Jump to a random step instead of the next one.
    #[serde(default)]
    pub randomize: bool,
    /// Seed for random stepping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl Default for SequencerDef {
    fn default() -> Self {
        Self {
            sequence: Vec::new(),
            triggers: Vec::new(),
            pitch: concert_pitch(),
            transpose: 0.0,
            randomize: false,
            seed: None,
        }
    }
}

/// Visit every numeric field of a declaration.
///
/// Used by validation to reject non-finite values with a precise field name.
pub trait NumericFields {
    /// Call `visit(field, value)` for each number, including modulation depths.
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32));
}

fn visit_param(visit: &mut dyn FnMut(&str, f32), field: &str, param: &ParamDef) {
    visit(field, param.val);
    visit(field, param.amount);
}

impl NumericFields for OscillatorDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "freq", &self.freq);
        visit_param(visit, "amp", &self.amp);
        visit_param(visit, "pan", &self.pan);
        visit_param(visit, "phase", &self.phase);
        for partial in &self.partials {
            visit("partials.ratio", partial.ratio);
            visit("partials.amp", partial.amp);
            visit("partials.phase", partial.phase);
        }
    }
}

impl NumericFields for NoiseDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "amp", &self.amp);
        visit_param(visit, "pan", &self.pan);
    }
}

impl NumericFields for WavetableDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        self.signal.iter().for_each(|&x| visit("signal", x));
        visit_param(visit, "freq", &self.freq);
        visit_param(visit, "amp", &self.amp);
        visit_param(visit, "pan", &self.pan);
    }
}

impl NumericFields for SignalDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        self.signal.iter().for_each(|&x| visit("signal", x));
        visit_param(visit, "freq", &self.freq);
        visit_param(visit, "amp", &self.amp);
        visit_param(visit, "pan", &self.pan);
        visit_param(visit, "phase", &self.phase);
    }
}

impl NumericFields for TextDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "freq", &self.freq);
        visit_param(visit, "amp", &self.amp);
        visit_param(visit, "pan", &self.pan);
        visit_param(visit, "phase", &self.phase);
    }
}

impl NumericFields for EnvelopeDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "threshold", &self.threshold);
        visit_param(visit, "attack", &self.attack);
        visit_param(visit, "decay", &self.decay);
        visit_param(visit, "sustain", &self.sustain);
        visit_param(visit, "release", &self.release);
        visit_param(visit, "peak", &self.peak);
        visit_param(visit, "level", &self.level);
    }
}

impl NumericFields for FilterDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "low", &self.low);
        visit_param(visit, "high", &self.high);
        visit_param(visit, "ramp", &self.ramp);
        visit_param(visit, "volume", &self.volume);
    }
}

impl NumericFields for GateDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        self.signal.iter().for_each(|&x| visit("signal", x));
        visit_param(visit, "bpm", &self.bpm);
    }
}

impl NumericFields for DelayDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit("time", self.time);
        visit_param(visit, "mix", &self.mix);
        visit_param(visit, "pan", &self.pan);
    }
}

impl NumericFields for MixerDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        for weight in self.inputs.values() {
            visit_param(visit, "inputs", weight);
        }
        visit_param(visit, "gain", &self.gain);
    }
}

impl NumericFields for PanDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit_param(visit, "pan", &self.pan);
    }
}

impl NumericFields for SamplerDef {
    fn visit_numbers(&self, _visit: &mut dyn FnMut(&str, f32)) {}
}

impl NumericFields for SequencerDef {
    fn visit_numbers(&self, visit: &mut dyn FnMut(&str, f32)) {
        visit("pitch", self.pitch);
        visit("transpose", self.transpose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_order_is_declaration_order() {
        let mut sorted = ModuleKind::EVALUATION_ORDER;
        sorted.sort();
        assert_eq!(sorted, ModuleKind::EVALUATION_ORDER);
        assert_eq!(ModuleKind::EVALUATION_ORDER[0], ModuleKind::Gate);
        assert_eq!(ModuleKind::EVALUATION_ORDER[12], ModuleKind::Delay);
    }

    #[test]
    fn wave_type_names() {
        #[derive(Deserialize)]
        struct W {
            #[serde(rename = "type")]
            wave: WaveType,
        }
        let w: W = toml::from_str(r#"type = "reverse-sawtooth""#).unwrap();
        assert_eq!(w.wave, WaveType::ReverseSawtooth);
        let w: W = toml::from_str(r#"type = "saw""#).unwrap();
        assert_eq!(Waveform::from(w.wave), Waveform::Sawtooth);
    }

    #[test]
    fn oscillator_defaults() {
        let osc: OscillatorDef = toml::from_str("").unwrap();
        assert_eq!(osc, OscillatorDef::default());
        assert_eq!(osc.freq.val, 440.0);
        assert_eq!(osc.amp.val, 1.0);
    }

    #[test]
    fn partial_defaults() {
        let osc: OscillatorDef = toml::from_str("partials = [{ ratio = 2 }, { amp = 0.5 }]").unwrap();
        assert_eq!(osc.partials[0], PartialDef { ratio: 2.0, amp: 1.0, phase: 0.0 });
        assert_eq!(osc.partials[1].ratio, 1.0);
    }

    #[test]
    fn visit_numbers_reports_fields() {
        let delay = DelayDef {
            time: f32::NAN,
            ..DelayDef::default()
        };
        let mut bad = Vec::new();
        delay.visit_numbers(&mut |field, value| {
            if !value.is_finite() {
                bad.push(field.to_string());
            }
        });
        assert_eq!(bad, vec!["time".to_string()]);
    }
}
