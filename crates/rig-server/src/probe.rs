//! Environment probe: resolve the capability facts of the server under test.

use rig_core::{ScannerInfo, ServerCapability};

use crate::{ServerClient, error::ServerError};

/// Resolve a [`ServerCapability`] for the server behind `client`.
///
/// `scanner_version` is the configured scanner build variant; it is not
/// something the server can tell us. Nothing is retried: if the server cannot
/// be reached, or reports any status other than `UP`, the probe fails.
///
/// # Errors
///
/// Returns [`ServerError::Unreachable`] when the server does not answer,
/// [`ServerError::NotReady`] when it is starting or migrating, and any other
/// [`ServerError`] from the version or plugin queries.
pub async fn probe(
    client: &ServerClient,
    scanner_version: Option<&str>,
) -> Result<ServerCapability, ServerError> {
    let status = client.system_status().await?;
    if status != "UP" {
        return Err(ServerError::NotReady(status));
    }

    let server_version = client.server_version().await?;
    let plugins = client.installed_plugins().await?;

    let capability = ServerCapability {
        server_version,
        plugins,
        scanner: ScannerInfo {
            version: scanner_version.map(str::to_string),
        },
    };

    tracing::info!(
        url = client.base_url(),
        version = %capability.server_version,
        plugins = capability.plugins.len(),
        scanner = capability.scanner.version.as_deref().unwrap_or("unknown"),
        "probed server"
    );
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeServer, Route};
    use rig_core::Feature;
    use serde_json::json;

    fn routes(status: &str) -> Vec<Route> {
        vec![
            Route::get("/api/system/status").json(200, json!({"status": status})),
            Route::get("/api/server/version").text(200, "7.4.0.18908"),
            Route::get("/api/plugins/installed").json(
                200,
                json!({"plugins": [{"key": "vbnet", "version": "7.10"}, {"key": "cpp", "version": "6.0"}]}),
            ),
        ]
    }

    #[tokio::test]
    async fn resolves_version_plugins_and_scanner() {
        let server = FakeServer::start(routes("UP"));
        let client = ServerClient::for_url(server.url()).unwrap();

        let caps = probe(&client, Some("4.3.1.1372")).await.unwrap();
        assert_eq!(caps.server_version.as_str(), "7.4.0.18908");
        assert!(caps.has(&Feature::ExternalIssues));
        assert!(caps.has(&Feature::ProjectModules));
        assert!(caps.has_plugin("cpp"));
        assert_eq!(caps.scanner.version.as_deref(), Some("4.3.1.1372"));
    }

    #[tokio::test]
    async fn starting_server_is_not_ready() {
        let server = FakeServer::start(routes("STARTING"));
        let client = ServerClient::for_url(server.url()).unwrap();

        let err = probe(&client, None).await.unwrap_err();
        assert!(matches!(err, ServerError::NotReady(ref s) if s == "STARTING"));
        assert!(server.requests_to("GET", "/api/server/version").is_empty());
    }

    #[tokio::test]
    async fn garbage_version_is_a_parse_error() {
        let server = FakeServer::start(vec![
            Route::get("/api/system/status").json(200, json!({"status": "UP"})),
            Route::get("/api/server/version").text(200, "<html>proxy</html>"),
        ]);
        let client = ServerClient::for_url(server.url()).unwrap();
        assert!(matches!(
            probe(&client, None).await.unwrap_err(),
            ServerError::Parse(_)
        ));
    }
}
