//! Capability facts about the server and scanner under test.
//!
//! A [`ServerCapability`] is resolved once per scenario by the environment
//! probe and passed by reference into verification. Expectation tables name a
//! [`Feature`] and the capability answers whether it is present, so no
//! assertion site ever re-queries or re-parses the server version.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::ServerVersion;

/// First server release that imports external (Roslyn) analyzer issues.
pub const EXTERNAL_ISSUES_SINCE: (u32, u32) = (7, 4);

/// First server release that drops module segments from file component keys.
pub const FLAT_COMPONENT_KEYS_SINCE: (u32, u32) = (7, 6);

/// The scanner build under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerInfo {
    /// Scanner build variant, e.g. `4.3.1.1372` or the legacy `2.1.0.0`.
    pub version: Option<String>,
}

/// Facts about the environment that decide which expectations apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapability {
    pub server_version: ServerVersion,
    /// Installed plugin key → plugin version.
    #[serde(default)]
    pub plugins: BTreeMap<String, String>,
    #[serde(default)]
    pub scanner: ScannerInfo,
}

impl ServerCapability {
    #[must_use]
    pub const fn new(server_version: ServerVersion) -> Self {
        Self {
            server_version,
            plugins: BTreeMap::new(),
            scanner: ScannerInfo { version: None },
        }
    }

    #[must_use]
    pub fn with_plugin(mut self, key: impl Into<String>, version: impl Into<String>) -> Self {
        self.plugins.insert(key.into(), version.into());
        self
    }

    #[must_use]
    pub fn with_scanner_version(mut self, version: impl Into<String>) -> Self {
        self.scanner.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn has_plugin(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    /// Whether `feature` holds in this environment.
    #[must_use]
    pub fn has(&self, feature: &Feature) -> bool {
        match feature {
            Feature::ExternalIssues => {
                let (major, minor) = EXTERNAL_ISSUES_SINCE;
                self.server_version.is_at_least(major, minor)
            }
            Feature::ProjectModules => {
                let (major, minor) = FLAT_COMPONENT_KEYS_SINCE;
                !self.server_version.is_at_least(major, minor)
            }
            Feature::MinVersion { major, minor } => {
                self.server_version.is_at_least(*major, *minor)
            }
            Feature::Plugin(key) => self.has_plugin(key),
            Feature::ScannerVersion(version) => {
                self.scanner.version.as_deref() == Some(version.as_str())
            }
        }
    }
}

/// A named, version- or installation-gated fact.
///
/// In scenario files unit variants are plain strings (`"external_issues"`) and
/// the others are single-key tables (`{ plugin = "cpp" }`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// The server imports issues raised by external analyzers.
    ExternalIssues,
    /// File component keys include the MSBuild project (module) segment.
    ProjectModules,
    MinVersion { major: u32, minor: u32 },
    Plugin(String),
    ScannerVersion(String),
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalIssues => f.write_str("external_issues"),
            Self::ProjectModules => f.write_str("project_modules"),
            Self::MinVersion { major, minor } => write!(f, "server >= {major}.{minor}"),
            Self::Plugin(key) => write!(f, "plugin '{key}'"),
            Self::ScannerVersion(version) => write!(f, "scanner {version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn capability(version: &str) -> ServerCapability {
        ServerCapability::new(version.parse().unwrap())
    }

    #[rstest]
    #[case("7.3", false)]
    #[case("7.4.0.18908", true)]
    #[case("8.9", true)]
    fn external_issues_gate(#[case] version: &str, #[case] expected: bool) {
        assert_eq!(capability(version).has(&Feature::ExternalIssues), expected);
    }

    #[rstest]
    #[case("7.5", true)]
    #[case("7.6", false)]
    fn project_modules_gate(#[case] version: &str, #[case] expected: bool) {
        assert_eq!(capability(version).has(&Feature::ProjectModules), expected);
    }

    #[test]
    fn plugin_and_scanner_facts() {
        let caps = capability("7.9")
            .with_plugin("vbnet", "7.10")
            .with_scanner_version("2.1.0.0");
        assert!(caps.has(&Feature::Plugin("vbnet".into())));
        assert!(!caps.has(&Feature::Plugin("cpp".into())));
        assert!(caps.has(&Feature::ScannerVersion("2.1.0.0".into())));
        assert!(!caps.has(&Feature::ScannerVersion("4.0.0.0".into())));
        assert!(caps.has(&Feature::MinVersion { major: 7, minor: 9 }));
    }

    #[test]
    fn feature_deserializes_from_string_or_table() {
        #[derive(Deserialize)]
        struct Holder {
            a: Feature,
            b: Feature,
        }
        let holder: Holder = serde_json::from_str(r#"{"a":"external_issues","b":{"plugin":"cpp"}}"#)
            .unwrap();
        assert_eq!(holder.a, Feature::ExternalIssues);
        assert_eq!(holder.b, Feature::Plugin("cpp".into()));
    }
}
