//! Shared HTTP response helpers for web query endpoints.
//!
//! Centralizes status-code checks (401/403 → [`ServerError::Unauthorized`],
//! 404 → [`ServerError::NotFound`], other non-success → [`ServerError::Api`])
//! so endpoint modules stay focused on request construction and response
//! mapping.

use crate::error::ServerError;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ServerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    match status.as_u16() {
        401 | 403 => Err(ServerError::Unauthorized {
            status: status.as_u16(),
            url,
        }),
        404 => Err(ServerError::NotFound(url)),
        code => Err(ServerError::Api {
            status: code,
            message: error_message(&resp.text().await.unwrap_or_default()),
        }),
    }
}

/// Extract `errors[].msg` from a web API error body, falling back to the raw body.
pub fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        errors: Vec<ErrorEntry>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorEntry {
        msg: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .filter(|parsed| !parsed.errors.is_empty())
        .map_or_else(
            || body.trim().to_string(),
            |parsed| {
                parsed
                    .errors
                    .into_iter()
                    .map(|e| e.msg)
                    .collect::<Vec<_>>()
                    .join("; ")
            },
        )
}

/// Build a `k=v&k=v` query string with percent-encoded values.
pub fn query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn check_response_success() {
        let resp = mock_response(200, "");
        assert!(check_response(resp).await.is_ok());
    }

    #[tokio::test]
    async fn check_response_unauthorized() {
        let err = check_response(mock_response(401, "")).await.unwrap_err();
        assert!(matches!(err, ServerError::Unauthorized { status: 401, .. }));
        let err = check_response(mock_response(403, "")).await.unwrap_err();
        assert!(matches!(err, ServerError::Unauthorized { status: 403, .. }));
    }

    #[tokio::test]
    async fn check_response_not_found() {
        let err = check_response(mock_response(404, "")).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn check_response_api_error_uses_error_messages() {
        let body = r#"{"errors":[{"msg":"Could not create Project, key already exists: cpp"}]}"#;
        let err = check_response(mock_response(400, body)).await.unwrap_err();
        match err {
            ServerError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Could not create Project, key already exists: cpp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("  plain failure \n"), "plain failure");
        assert_eq!(error_message(r#"{"errors":[]}"#), r#"{"errors":[]}"#);
    }

    #[test]
    fn query_encodes_values() {
        assert_eq!(
            query(&[("component", "my.project:ConsoleVBNet/Module1.vb"), ("metricKeys", "ncloc")]),
            "component=my.project%3AConsoleVBNet%2FModule1.vb&metricKeys=ncloc"
        );
    }
}
