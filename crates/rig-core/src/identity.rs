//! Project key validation.
//!
//! The server accepts keys made of ASCII letters, digits, `-`, `_`, `.` and
//! `:`, with at least one non-digit character and at most 400 characters.
//! Checking locally lets the provisioner report the offending key before any
//! request is sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const MAX_KEY_LEN: usize = 400;

/// A validated analysis target key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Validate and wrap `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] naming the key and the violated rule.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        let invalid = |reason: &str| CoreError::InvalidKey {
            key: key.clone(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(invalid("key is longer than 400 characters"));
        }
        if let Some(bad) = key.chars().find(|c| !is_key_char(*c)) {
            return Err(invalid(&format!("character '{bad}' is not allowed")));
        }
        if key.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("key must contain at least one non-digit character"));
        }

        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectKey> for String {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ProjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
