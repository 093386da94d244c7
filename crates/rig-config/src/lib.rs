//! # rig-config
//!
//! Layered configuration loading for scanrig using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SCANRIG_*` prefix, `__` as separator)
//! 2. An explicit file passed with `rig --config <path>`
//! 3. Project-level `.scanrig/config.toml`
//! 4. User-level `~/.config/scanrig/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SCANRIG_SERVER__URL` -> `server.url`,
//! `SCANRIG_COMPLETION__POLICY` -> `completion.policy`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use rig_config::RigConfig;
//!
//! let config = RigConfig::load_with_dotenv(None).expect("config");
//! println!("server: {}", config.server.base_url());
//! ```

mod build;
mod completion;
mod error;
mod general;
mod scanner;
mod server;

pub use build::{BuildConfig, CaptureConfig};
pub use completion::{CompletionConfig, CompletionMode};
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use scanner::ScannerConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RigConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RigConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit
            && !path.is_file()
        {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Loads `.env` from the current directory (if present) before building
    /// the figment. This is the entry point for the CLI.
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".scanrig/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit --config file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("SCANRIG_").split("__"))
    }

    /// Cross-field checks that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.is_configured() {
            return Err(ConfigError::ServerUrlMissing);
        }
        if !self.server.token.is_empty() && !self.server.login.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.login".into(),
                reason: "set either server.token or server.login, not both".into(),
            });
        }
        self.completion.validate()
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scanrig").join("config.toml"))
    }
}
