use serde::{Deserialize, Serialize};

use crate::enums::Phase;

/// The result of one external process run: exit status plus captured log text.
///
/// `exit_code` is `None` when the process could not be launched or was killed
/// by a signal; the log then explains why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub phase: Phase,
    /// Command line as run, with sensitive values redacted.
    pub command: String,
    pub exit_code: Option<i32>,
    pub log: String,
}

impl BuildOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    #[must_use]
    pub fn log_contains(&self, needle: &str) -> bool {
        self.log.contains(needle)
    }

    /// Last `lines` lines of the log, for error messages.
    #[must_use]
    pub fn log_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.log.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}
