use serde::{Deserialize, Serialize};

/// A rule violation reported against a component. Read-only after session end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub rule_key: String,
    pub component_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl IssueRecord {
    #[must_use]
    pub fn new(rule_key: impl Into<String>, component_key: impl Into<String>) -> Self {
        Self {
            rule_key: rule_key.into(),
            component_key: component_key.into(),
            message: None,
            line: None,
        }
    }

    /// `true` for issues imported from an external analyzer (`external_*` repositories).
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.rule_key.starts_with("external_")
    }
}
