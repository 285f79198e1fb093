//! Error types for graph construction and control.

use modsynth_config::{ConfigError, ValidationError};
use modsynth_core::NoteError;
use thiserror::Error;

/// Errors from building a synth graph or talking to a running one.
///
/// Construction errors leave any live graph untouched; nothing on the
/// per-sample path returns an error.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The patch could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The patch failed validation.
    #[error("invalid patch: {0}")]
    Validation(#[from] ValidationError),

    /// A sequencer step is not a valid note name.
    #[error("sequencer '{module}': invalid note '{note}': {reason}")]
    InvalidNote {
        /// Sequencer name.
        module: String,
        /// Offending note text.
        note: String,
        /// Parse failure.
        #[source]
        reason: NoteError,
    },

    /// The producer side has gone away.
    #[error("control channel closed")]
    ControlClosed,

    /// No matching notification arrived in time.
    #[error("timed out waiting for notification")]
    Timeout,
}
