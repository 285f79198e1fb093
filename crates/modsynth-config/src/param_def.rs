//! Declared form of a modulatable parameter.

use modsynth_core::{Param, Range};
use serde::{Deserialize, Serialize};

/// A parameter as written in a patch.
///
/// Accepts either a bare number or a table naming modulation sources:
///
/// ```toml
/// freq = 220
/// amp = { val = 0.5, mod = ["lfo", "env"], modamp = 0.2 }
/// ```
///
/// A bare number is shorthand for `{ val = n }` and is written back that way
/// whenever there is no modulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ParamRepr", into = "ParamRepr")]
pub struct ParamDef {
    /// Base value.
    pub val: f32,
    /// Names of the modules whose mono output modulates this parameter.
    pub sources: Vec<String>,
    /// Modulation depth applied to the summed sources.
    pub amount: f32,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ParamRepr {
    Value(f32),
    Modulated {
        #[serde(default)]
        val: f32,
        #[serde(default, rename = "mod", skip_serializing_if = "Vec::is_empty")]
        sources: Vec<String>,
        #[serde(default)]
        modamp: f32,
    },
}

impl From<ParamRepr> for ParamDef {
    fn from(repr: ParamRepr) -> Self {
        match repr {
            ParamRepr::Value(val) => Self::value(val),
            ParamRepr::Modulated {
                val,
                sources,
                modamp,
            } => Self {
                val,
                sources,
                amount: modamp,
            },
        }
    }
}

impl From<ParamDef> for ParamRepr {
    fn from(def: ParamDef) -> Self {
        if def.sources.is_empty() && def.amount == 0.0 {
            ParamRepr::Value(def.val)
        } else {
            ParamRepr::Modulated {
                val: def.val,
                sources: def.sources,
                modamp: def.amount,
            }
        }
    }
}

impl From<f32> for ParamDef {
    fn from(val: f32) -> Self {
        Self::value(val)
    }
}

impl ParamDef {
    /// Unmodulated value.
    pub fn value(val: f32) -> Self {
        Self {
            val,
            sources: Vec::new(),
            amount: 0.0,
        }
    }

    /// Add modulation sources and depth.
    pub fn modulated<I, S>(mut self, sources: I, amount: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self.amount = amount;
        self
    }

    /// Build the runtime parameter clamped to `range`.
    ///
    /// The result still has to be linked against the graph's slot names.
    pub fn to_param(&self, range: Range) -> Param {
        Param::new(self.val, range).with_modulation(self.sources.iter().cloned(), self.amount)
    }

    /// True if the value and depth are finite.
    pub fn is_finite(&self) -> bool {
        self.val.is_finite() && self.amount.is_finite()
    }
}
