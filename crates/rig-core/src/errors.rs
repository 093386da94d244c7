//! Cross-cutting error types for scanrig.
//!
//! Domain-specific errors (`ServerError`, `SessionError`, `VerifyError`) live in
//! their respective crates. `rig-cli` converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any scanrig crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A project or component key does not match the server's key grammar.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// A version string could not be parsed.
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
