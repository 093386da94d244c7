//! Server identity endpoints: version, status, installed plugins.

use std::collections::BTreeMap;

use rig_core::ServerVersion;

use crate::{ServerClient, error::ServerError};

#[derive(Debug, serde::Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, serde::Deserialize)]
struct PluginsResponse {
    #[serde(default)]
    plugins: Vec<Plugin>,
}

#[derive(Debug, serde::Deserialize)]
struct Plugin {
    key: String,
    #[serde(default)]
    version: String,
}

impl ServerClient {
    /// `GET api/server/version`, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or the body is not a
    /// version string.
    pub async fn server_version(&self) -> Result<ServerVersion, ServerError> {
        let body = self.get("api/server/version").await?.text().await?;
        body.trim()
            .parse()
            .map_err(|_| ServerError::Parse(format!("unexpected server version '{}'", body.trim())))
    }

    /// `GET api/system/status` → the `status` field (`UP`, `STARTING`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or the body cannot be parsed.
    pub async fn system_status(&self) -> Result<String, ServerError> {
        let resp: StatusResponse = self.get("api/system/status").await?.json().await?;
        Ok(resp.status)
    }

    /// `GET api/plugins/installed` → plugin key → version.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or the body cannot be parsed.
    pub async fn installed_plugins(&self) -> Result<BTreeMap<String, String>, ServerError> {
        let resp: PluginsResponse = self.get("api/plugins/installed").await?.json().await?;
        Ok(resp
            .plugins
            .into_iter()
            .map(|p| (p.key, p.version))
            .collect())
    }
}
