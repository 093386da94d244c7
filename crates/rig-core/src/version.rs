//! Server version parsing.
//!
//! Server versions have up to four numeric components
//! (`major.minor[.patch[.build]]`, e.g. `7.4.0.18908`), and some builds carry a
//! qualifier after a dash (`7.9-SNAPSHOT`). Only the numeric part takes part in
//! comparisons.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
    raw: String,
}

impl ServerVersion {
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
            build: 0,
            raw: format!("{major}.{minor}"),
        }
    }

    /// `true` when this version is `major.minor` or newer.
    #[must_use]
    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// The string the server reported.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    const fn numeric(&self) -> (u32, u32, u32, u32) {
        (self.major, self.minor, self.patch, self.build)
    }
}

impl FromStr for ServerVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let numeric = raw.split_once('-').map_or(raw, |(head, _)| head);
        let parts = numeric
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CoreError::InvalidVersion(raw.to_string()))?;

        if !(2..=4).contains(&parts.len()) {
            return Err(CoreError::InvalidVersion(raw.to_string()));
        }

        let part = |idx: usize| parts.get(idx).copied().unwrap_or(0);
        Ok(Self {
            major: part(0),
            minor: part(1),
            patch: part(2),
            build: part(3),
            raw: raw.to_string(),
        })
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerVersion> for String {
    fn from(version: ServerVersion) -> Self {
        version.raw
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_four_component_version() {
        let v: ServerVersion = "7.4.0.18908".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch, v.build), (7, 4, 0, 18908));
        assert_eq!(v.to_string(), "7.4.0.18908");
    }

    #[test]
    fn parses_snapshot_qualifier() {
        let v: ServerVersion = "7.9-SNAPSHOT".parse().unwrap();
        assert_eq!((v.major, v.minor), (7, 9));
        assert_eq!(v.as_str(), "7.9-SNAPSHOT");
    }

    #[rstest]
    #[case("")]
    #[case("7")]
    #[case("seven.four")]
    #[case("7.4.0.1.2")]
    fn rejects_garbage(#[case] raw: &str) {
        assert!(raw.parse::<ServerVersion>().is_err());
    }

    #[rstest]
    #[case("7.4.0.18908", 7, 4, true)]
    #[case("7.3.2", 7, 4, false)]
    #[case("8.0", 7, 4, true)]
    #[case("6.7.5", 7, 4, false)]
    #[case("7.6", 7, 6, true)]
    fn at_least(#[case] raw: &str, #[case] major: u32, #[case] minor: u32, #[case] expected: bool) {
        let v: ServerVersion = raw.parse().unwrap();
        assert_eq!(v.is_at_least(major, minor), expected);
    }

    #[test]
    fn ordering_is_numeric() {
        let a: ServerVersion = "7.10".parse().unwrap();
        let b: ServerVersion = "7.9.3".parse().unwrap();
        assert!(a > b);
    }
}
