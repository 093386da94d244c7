//! Status enums shared across crates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// State of one scan session.
///
/// ```text
/// idle → began → built → ended
///              → ended
/// ```
///
/// The typed session in `rig-session` only exposes the legal moves; this enum
/// is the runtime record of where a session stands (logged, reported, and
/// checked on every transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Began,
    Built,
    Ended,
}

impl SessionState {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Idle => &[Self::Began],
            Self::Began => &[Self::Built, Self::Ended],
            Self::Built => &[Self::Ended],
            Self::Ended => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Validate a move to `next` for the session identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when `next` is not reachable
    /// from `self`.
    pub fn transition(self, next: Self, id: &str) -> Result<Self, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                entity_type: "scan_session".to_string(),
                id: id.to_string(),
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Began => "began",
            Self::Built => "built",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The external process a log or outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Begin,
    Build,
    End,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Build => "build",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SessionState::Idle, SessionState::Began, true)]
    #[case(SessionState::Began, SessionState::Built, true)]
    #[case(SessionState::Began, SessionState::Ended, true)]
    #[case(SessionState::Built, SessionState::Ended, true)]
    #[case(SessionState::Idle, SessionState::Ended, false)]
    #[case(SessionState::Idle, SessionState::Built, false)]
    #[case(SessionState::Built, SessionState::Built, false)]
    #[case(SessionState::Ended, SessionState::Ended, false)]
    #[case(SessionState::Ended, SessionState::Began, false)]
    fn session_transitions(
        #[case] from: SessionState,
        #[case] to: SessionState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let err = SessionState::Idle
            .transition(SessionState::Ended, "cpp")
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                entity_type: "scan_session".into(),
                id: "cpp".into(),
                from: "idle".into(),
                to: "ended".into(),
            }
        );
    }

    #[test]
    fn ended_is_terminal() {
        assert!(SessionState::Ended.allowed_next_states().is_empty());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SessionState::Began).unwrap();
        assert_eq!(json, "\"began\"");
        let phase: Phase = serde_json::from_str("\"build\"").unwrap();
        assert_eq!(phase, Phase::Build);
    }
}
