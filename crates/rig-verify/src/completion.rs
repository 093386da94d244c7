//! When may results be queried after a session ended?
//!
//! The server computes issues and measures in a background task after the
//! scanner's end step uploads the analysis. [`CompletionPolicy::Synchronous`]
//! trusts the end step to return only once results are queryable and asks
//! the server nothing. [`CompletionPolicy::Poll`] watches the component's
//! background tasks with exponential backoff (capped at `max_interval`).

use std::time::Duration;

use rig_config::{CompletionConfig, CompletionMode};
use rig_server::ServerClient;

use crate::error::VerifyError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    #[default]
    Synchronous,
    Poll {
        /// Delay before the second check.
        interval: Duration,
        /// Maximum delay between checks.
        max_interval: Duration,
        /// Maximum number of checks (including the first).
        max_attempts: u32,
    },
}

impl From<&CompletionConfig> for CompletionPolicy {
    fn from(config: &CompletionConfig) -> Self {
        match config.policy {
            CompletionMode::Synchronous => Self::Synchronous,
            CompletionMode::Poll => Self::Poll {
                interval: Duration::from_millis(config.interval_ms),
                max_interval: Duration::from_millis(config.max_interval_ms),
                max_attempts: config.max_attempts,
            },
        }
    }
}

impl CompletionPolicy {
    /// Wait until results for `component` are queryable.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::AnalysisFailed`] if the background task failed
    /// - [`VerifyError::AnalysisIncomplete`] if the poll budget ran out
    /// - [`VerifyError::Server`] if a status check fails
    pub async fn wait(&self, client: &ServerClient, component: &str) -> Result<(), VerifyError> {
        let Self::Poll {
            interval,
            max_interval,
            max_attempts,
        } = self
        else {
            return Ok(());
        };

        let mut delay = *interval;
        for attempt in 1..=*max_attempts {
            let tasks = client
                .component_tasks(component)
                .await
                .map_err(VerifyError::server(format!(
                    "checking analysis status of '{component}'"
                )))?;

            if tasks.is_complete() {
                tracing::debug!(component, attempt, "analysis processed");
                return Ok(());
            }
            if tasks.has_failed() {
                return Err(VerifyError::AnalysisFailed {
                    key: component.to_string(),
                    status: tasks.last_status.unwrap_or_default(),
                    message: tasks.last_error.unwrap_or_default(),
                });
            }

            if attempt < *max_attempts {
                tracing::debug!(
                    component,
                    attempt,
                    pending = tasks.pending,
                    "analysis pending, checking again in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, *max_interval);
            }
        }

        Err(VerifyError::AnalysisIncomplete {
            key: component.to_string(),
            attempts: *max_attempts,
        })
    }
}
