//! Errors from loading and validating scanrig configuration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A TOML layer or `SCANRIG_*` variable does not fit the config shape.
    /// Figment's message names the layer that failed.
    #[error("cannot read scanrig configuration: {0}")]
    Figment(#[from] figment::Error),

    /// `rig --config <path>` named a file that is not there.
    #[error("config file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("no server to test against: set [server] url or SCANRIG_SERVER__URL")]
    ServerUrlMissing,

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
