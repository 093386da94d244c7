//! Wrapped build step and capture adapter settings.

use serde::{Deserialize, Serialize};

fn default_program() -> String {
    String::from("msbuild")
}

fn default_args() -> Vec<String> {
    vec![String::from("/t:Rebuild")]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Build tool invoked between `begin` and `end`.
    #[serde(default = "default_program")]
    pub program: String,

    /// Default arguments when a scenario does not override them.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Capture adapter executable, or a directory containing it.
    #[serde(default)]
    pub adapter: String,
}

impl CaptureConfig {
    pub fn is_configured(&self) -> bool {
        !self.adapter.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults_rebuild_with_msbuild() {
        let config = BuildConfig::default();
        assert_eq!(config.program, "msbuild");
        assert_eq!(config.args, vec!["/t:Rebuild".to_string()]);
    }

    #[test]
    fn capture_unconfigured_by_default() {
        assert!(!CaptureConfig::default().is_configured());
    }
}
