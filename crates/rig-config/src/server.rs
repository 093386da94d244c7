//! Analysis server connection settings.

use serde::{Deserialize, Serialize};

fn default_url() -> String {
    String::from("http://localhost:9000")
}

const fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., `http://localhost:9000`).
    #[serde(default = "default_url")]
    pub url: String,

    /// User token. Sent as the basic-auth login with an empty password, and
    /// forwarded to the scanner as `sonar.login`.
    #[serde(default)]
    pub token: String,

    /// Login for basic auth when no token is set.
    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub password: String,

    /// Per-request timeout for web queries, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: String::new(),
            login: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Whether any credentials are set.
    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() || !self.login.is_empty()
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
