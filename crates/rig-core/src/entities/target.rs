use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::ProjectKey;

/// The project identity registered on the server before scanning.
///
/// Owned by exactly one scenario at a time and reset between scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTarget {
    pub key: ProjectKey,
    pub name: String,
    /// Language → bound quality profile name.
    #[serde(default)]
    pub profiles: BTreeMap<String, String>,
}

impl AnalysisTarget {
    #[must_use]
    pub fn new(key: ProjectKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            profiles: BTreeMap::new(),
        }
    }

    /// Record that `profile` is bound to this target for `language`.
    pub fn bind(&mut self, language: impl Into<String>, profile: impl Into<String>) {
        self.profiles.insert(language.into(), profile.into());
    }

    #[must_use]
    pub fn profile_for(&self, language: &str) -> Option<&str> {
        self.profiles.get(language).map(String::as_str)
    }
}
