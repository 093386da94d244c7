use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A named, language-scoped rule configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub name: String,
    pub language: String,
    pub rules: Vec<RuleActivation>,
}

impl QualityProfile {
    /// Fully-qualified keys (`repository:key`) of every activated rule.
    #[must_use]
    pub fn rule_keys(&self) -> BTreeSet<String> {
        self.rules.iter().map(RuleActivation::rule_key).collect()
    }

    #[must_use]
    pub fn handle(&self) -> ProfileHandle {
        ProfileHandle {
            name: self.name.clone(),
            language: self.language.clone(),
        }
    }
}

/// One rule activated by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleActivation {
    pub repository: String,
    pub key: String,
    pub priority: Option<String>,
}

impl RuleActivation {
    #[must_use]
    pub fn rule_key(&self) -> String {
        format!("{}:{}", self.repository, self.key)
    }
}

/// Reference to a profile registered on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileHandle {
    pub name: String,
    pub language: String,
}
