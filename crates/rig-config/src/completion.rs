//! Policy for waiting on server-side processing after `end`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_interval_ms() -> u64 {
    500
}

const fn default_max_interval_ms() -> u64 {
    5_000
}

const fn default_max_attempts() -> u32 {
    60
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// Query results immediately after `end` returns.
    #[default]
    Synchronous,
    /// Poll the server's task queue with exponential backoff before querying.
    Poll,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub policy: CompletionMode,

    /// First delay between polls, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Backoff cap, in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Maximum number of polls before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            policy: CompletionMode::default(),
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl CompletionConfig {
    /// Reject settings that would make polling meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy != CompletionMode::Poll {
            return Ok(());
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "completion.max_attempts".into(),
                reason: "must be at least 1 when policy is 'poll'".into(),
            });
        }
        if self.max_interval_ms < self.interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "completion.max_interval_ms".into(),
                reason: format!(
                    "must not be smaller than interval_ms ({})",
                    self.interval_ms
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronous_by_default() {
        let config = CompletionConfig::default();
        assert_eq!(config.policy, CompletionMode::Synchronous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_attempts_is_ignored_when_synchronous() {
        let config = CompletionConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn poll_requires_attempts() {
        let config = CompletionConfig {
            policy: CompletionMode::Poll,
            max_attempts: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "completion.max_attempts"));
    }

    #[test]
    fn poll_rejects_inverted_backoff_bounds() {
        let config = CompletionConfig {
            policy: CompletionMode::Poll,
            interval_ms: 1_000,
            max_interval_ms: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
