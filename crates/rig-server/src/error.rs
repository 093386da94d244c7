//! Web query and provisioning error types.

use std::path::PathBuf;

use rig_core::CoreError;
use thiserror::Error;

/// Errors from talking to the analysis server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server could not be reached at all (connect, DNS, timeout).
    #[error("server unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP transport or body decoding error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials were rejected (401/403).
    #[error("not authorized ({status}) for {url}")]
    Unauthorized { status: u16, url: String },

    /// The endpoint or the requested entity does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Server API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The server answered but is not ready to serve requests.
    #[error("server is not ready: status {0}")]
    NotReady(String),

    /// Failed to interpret a server response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors from registering targets and profiles.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    InvalidKey(#[from] CoreError),

    #[error("cannot read profile definition {path}: {source}")]
    ProfileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed profile definition {path}: {reason}")]
    ProfileMalformed { path: PathBuf, reason: String },

    #[error("project '{key}' is already provisioned as '{existing}', not '{requested}'")]
    Conflict {
        key: String,
        existing: String,
        requested: String,
    },

    #[error("project '{0}' has not been provisioned")]
    MissingTarget(String),

    #[error("profile '{name}' for language '{language}' has not been loaded")]
    MissingProfile { name: String, language: String },

    #[error("{context}: {source}")]
    Server {
        context: String,
        #[source]
        source: ServerError,
    },
}

impl ProvisionError {
    pub(crate) fn server(context: impl Into<String>) -> impl FnOnce(ServerError) -> Self {
        let context = context.into();
        move |source| Self::Server { context, source }
    }
}
