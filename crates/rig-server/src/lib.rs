//! # rig-server
//!
//! Web query client for the analysis server, plus the two components that
//! only talk to it:
//! - the environment probe ([`probe()`]), which resolves a [`ServerCapability`]
//!   once per scenario
//! - the [`Provisioner`], which registers targets and quality profiles and
//!   resets them between scenarios
//!
//! Endpoints are read-only except for provisioning. Every call blocks the
//! caller until the server answers; nothing here retries.
//!
//! [`ServerCapability`]: rig_core::ServerCapability

pub mod ce;
pub mod issues;
pub mod measures;
pub mod probe;
pub mod profile_xml;
pub mod profiles;
pub mod projects;
pub mod provision;
pub mod system;

mod error;
mod http;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{ProvisionError, ServerError};
pub use probe::probe;
pub use provision::Provisioner;

use std::time::Duration;

use rig_config::ServerConfig;

// ── Client ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Credentials {
    Token(String),
    Basic { login: String, password: String },
}

/// HTTP client for the server's web API.
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ServerClient {
    /// Create a client for the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Http`] if the underlying `reqwest::Client` fails
    /// to build.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let http = reqwest::Client::builder()
            .user_agent("scanrig/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let credentials = if !config.token.is_empty() {
            Some(Credentials::Token(config.token.clone()))
        } else if !config.login.is_empty() {
            Some(Credentials::Basic {
                login: config.login.clone(),
                password: config.password.clone(),
            })
        } else {
            None
        };

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            credentials,
        })
    }

    /// Client for `url` with default settings and no credentials.
    ///
    /// # Errors
    ///
    /// See [`ServerClient::new`].
    pub fn for_url(url: &str) -> Result<Self, ServerError> {
        Self::new(&ServerConfig {
            url: url.to_string(),
            ..ServerConfig::default()
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path_and_query: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            path_and_query.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(Credentials::Token(token)) => request.basic_auth(token, Some("")),
            Some(Credentials::Basic { login, password }) => {
                request.basic_auth(login, Some(password))
            }
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, ServerError> {
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| ServerError::Unreachable {
                url: url.to_string(),
                source,
            })?;
        http::check_response(resp).await
    }

    pub(crate) async fn get(&self, path_and_query: &str) -> Result<reqwest::Response, ServerError> {
        let url = self.url(path_and_query);
        tracing::debug!(%url, "GET");
        self.send(self.http.get(&url), &url).await
    }

    pub(crate) async fn post(&self, path_and_query: &str) -> Result<reqwest::Response, ServerError> {
        let url = self.url(path_and_query);
        tracing::debug!(%url, "POST");
        self.send(self.http.post(&url), &url).await
    }

    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response, ServerError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST multipart");
        self.send(self.http.post(&url).multipart(form), &url).await
    }
}
