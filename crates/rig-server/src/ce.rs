//! Background task (compute engine) status, used to wait for post-processing.

use crate::{ServerClient, error::ServerError, http::query};

/// Processing state of one component's analysis reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTasks {
    /// Reports still waiting or being processed.
    pub pending: usize,
    /// Status of the most recently finished task (`SUCCESS`, `FAILED`, `CANCELED`).
    pub last_status: Option<String>,
    pub last_error: Option<String>,
}

impl ComponentTasks {
    /// Nothing queued and the last task finished successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.last_status.as_deref() == Some("SUCCESS")
    }

    /// Nothing queued and the last task did not succeed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.pending == 0
            && self
                .last_status
                .as_deref()
                .is_some_and(|status| status != "SUCCESS")
    }
}

#[derive(Debug, serde::Deserialize)]
struct ComponentResponse {
    #[serde(default)]
    queue: Vec<serde_json::Value>,
    current: Option<Task>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    status: String,
    error_message: Option<String>,
}

impl ServerClient {
    /// `GET api/ce/component?component=`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or cannot be parsed.
    pub async fn component_tasks(&self, component: &str) -> Result<ComponentTasks, ServerError> {
        let q = query(&[("component", component)]);
        let resp: ComponentResponse = self
            .get(&format!("api/ce/component?{q}"))
            .await?
            .json()
            .await?;
        Ok(ComponentTasks {
            pending: resp.queue.len(),
            last_status: resp.current.as_ref().map(|t| t.status.clone()),
            last_error: resp.current.and_then(|t| t.error_message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ComponentTasks {
        let resp: ComponentResponse = serde_json::from_str(body).unwrap();
        ComponentTasks {
            pending: resp.queue.len(),
            last_status: resp.current.as_ref().map(|t| t.status.clone()),
            last_error: resp.current.and_then(|t| t.error_message),
        }
    }

    #[test]
    fn queued_report_is_not_complete() {
        let tasks = parse(r#"{"queue":[{"id":"A","status":"PENDING"}],"current":{"status":"SUCCESS"}}"#);
        assert!(!tasks.is_complete());
        assert!(!tasks.has_failed());
    }

    #[test]
    fn empty_queue_with_success_is_complete() {
        let tasks = parse(r#"{"queue":[],"current":{"status":"SUCCESS"}}"#);
        assert!(tasks.is_complete());
    }

    #[test]
    fn failed_task_carries_error() {
        let tasks = parse(
            r#"{"queue":[],"current":{"status":"FAILED","errorMessage":"Invalid character encountered in file"}}"#,
        );
        assert!(tasks.has_failed());
        assert_eq!(
            tasks.last_error.as_deref(),
            Some("Invalid character encountered in file")
        );
    }

    #[test]
    fn never_analyzed_is_neither() {
        let tasks = parse(r#"{"queue":[]}"#);
        assert!(!tasks.is_complete());
        assert!(!tasks.has_failed());
    }
}
