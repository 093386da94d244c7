//! Session protocol and capture staging errors.

use std::path::PathBuf;

use rig_core::CoreError;
use rig_core::entities::BuildOutcome;
use rig_core::enums::Phase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// `begin` was asked to scan a directory that does not exist.
    #[error("source root {0} does not exist")]
    SourceRootMissing(PathBuf),

    /// The scanner is not configured, so there is nothing to run.
    #[error("scanner executable is not configured (set [scanner] executable)")]
    ScannerNotConfigured,

    /// The scanner's begin or end step exited unsuccessfully.
    #[error("scanner {phase} step failed (exit {}):\n{}", exit_label(.outcome), .outcome.log_tail(20))]
    PhaseFailed {
        phase: Phase,
        outcome: Box<BuildOutcome>,
    },

    /// An out-of-order session operation.
    #[error(transparent)]
    Protocol(#[from] CoreError),

    #[error("no capture adapter found at {0}")]
    AdapterNotFound(PathBuf),

    #[error("cannot stage {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// The process outcome carried by a [`SessionError::PhaseFailed`].
    #[must_use]
    pub fn outcome(&self) -> Option<&BuildOutcome> {
        match self {
            Self::PhaseFailed { outcome, .. } => Some(&**outcome),
            _ => None,
        }
    }
}

fn exit_label(outcome: &BuildOutcome) -> String {
    outcome
        .exit_code
        .map_or_else(|| "none".to_string(), |code| code.to_string())
}
