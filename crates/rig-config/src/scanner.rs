//! Scanner executable settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Path to the scanner executable (or its `.dll` when a launcher is set).
    #[serde(default)]
    pub executable: String,

    /// Optional launcher the executable is passed to (e.g., `dotnet`).
    #[serde(default)]
    pub launcher: String,

    /// Scanner build variant under test (e.g., `4.3.1.1372`).
    #[serde(default)]
    pub version: String,

    /// Value forwarded to the scanner as `SONAR_SCANNER_OPTS`.
    #[serde(default)]
    pub opts: String,
}

impl ScannerConfig {
    pub fn is_configured(&self) -> bool {
        !self.executable.is_empty()
    }

    pub fn launcher(&self) -> Option<&str> {
        (!self.launcher.is_empty()).then_some(self.launcher.as_str())
    }

    pub fn version(&self) -> Option<&str> {
        (!self.version.is_empty()).then_some(self.version.as_str())
    }
}
