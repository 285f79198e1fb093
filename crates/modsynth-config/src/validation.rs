//! Patch validation.
//!
//! Rejects the structural mistakes a synth graph cannot be built from:
//! module names that are empty, contain whitespace, or are declared more
//! than once (across all kinds), and numeric values that are not finite.
//!
//! Names that merely point nowhere (an unknown modulation source, trigger,
//! or bus entry) are *not* errors. They contribute silence at run time.
//!
//! # Example
//!
//! ```rust
//! use modsynth_config::{Patch, ValidationError, validate_patch};
//!
//! let patch = Patch::from_toml(r#"
//! [oscillators.a]
//! [noises.a]
//! "#).unwrap();
//!
//! assert!(matches!(validate_patch(&patch), Err(ValidationError::DuplicateName { .. })));
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

use crate::module_def::ModuleKind;
use crate::patch::Patch;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Two declarations share a name.
    #[error("module '{name}' declared as both {first} and {second}")]
    DuplicateName {
        /// The shared name.
        name: String,
        /// Kind of the first declaration.
        first: ModuleKind,
        /// Kind of the repeated declaration.
        second: ModuleKind,
    },

    /// A module was declared with an empty name.
    #[error("{0} declared with an empty name")]
    EmptyName(String),

    /// A module name contains whitespace.
    #[error("module name '{0}' contains whitespace")]
    InvalidName(String),

    /// A numeric field is not usable.
    #[error("{module}.{field}: invalid value {value} ({reason})")]
    InvalidValue {
        /// Module name, or `patch` for top-level fields.
        module: String,
        /// Field name.
        field: String,
        /// Offending value.
        value: f32,
        /// Why the value is rejected.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_number(
    errors: &mut Vec<ValidationError>,
    module: &str,
    field: &str,
    value: f32,
    non_negative: bool,
) {
    let reason = if !value.is_finite() {
        "must be finite"
    } else if non_negative && value < 0.0 {
        "must not be negative"
    } else {
        return;
    };
    errors.push(ValidationError::InvalidValue {
        module: module.to_string(),
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    });
}

/// Validate a single module name.
pub fn validate_name(kind: ModuleKind, name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        Err(ValidationError::EmptyName(kind.to_string()))
    } else if name.chars().any(char::is_whitespace) {
        Err(ValidationError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Validate a whole patch, collecting every problem found.
pub fn validate_patch(patch: &Patch) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_number(&mut errors, "patch", "vol", patch.vol, false);
    check_number(&mut errors, "patch", "glide", patch.glide, true);

    let mut seen: BTreeMap<&str, ModuleKind> = BTreeMap::new();
    for (name, def) in patch.modules() {
        let kind = def.kind();

        if let Err(e) = validate_name(kind, name) {
            errors.push(e);
        }

        if let Some(&first) = seen.get(name) {
            errors.push(ValidationError::DuplicateName {
                name: name.to_string(),
                first,
                second: kind,
            });
        } else {
            seen.insert(name, kind);
        }

        def.numbers().visit_numbers(&mut |field, value| {
            check_number(&mut errors, name, field, value, field == "time");
        });
    }

    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}
