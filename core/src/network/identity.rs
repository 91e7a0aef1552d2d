//! Lightweight identity check run once both service ports answered.
//!
//! The target service publishes an API listing (`GET /info`) shaped like
//! `{"named_endpoints": {"/change_choices": {...}, ...}, ...}`. A host whose
//! listing has that shape, and names the expected endpoint, is accepted.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::config::IdentityConfig;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("identity request answered with status {0}")]
    Status(StatusCode),

    #[error("response does not match the service signature: {0}")]
    Mismatch(&'static str),
}

/// Confirms that the service listening on `ip:port` is the expected one.
#[async_trait]
pub trait IdentityCheck: Send + Sync {
    async fn confirm(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpIdentityCheck {
    config: IdentityConfig,
}

impl HttpIdentityCheck {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    pub fn url(&self, ip: Ipv4Addr, port: u16) -> String {
        let path = self.config.path.trim_start_matches('/');
        format!("http://{ip}:{port}/{path}")
    }
}

#[async_trait]
impl IdentityCheck for HttpIdentityCheck {
    async fn confirm(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> Result<(), IdentityError> {
        // LAN hosts must never be reached through a proxy from the environment.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;

        let response = client.get(self.url(ip, port)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Status(status));
        }

        let body: Value = response.json().await?;
        matches_signature(&body, self.config.expected_endpoint.as_deref())
    }
}

/// Checks the API-listing shape of an identity response body.
pub fn matches_signature(body: &Value, expected_endpoint: Option<&str>) -> Result<(), IdentityError> {
    let endpoints = body
        .get("named_endpoints")
        .and_then(Value::as_object)
        .ok_or(IdentityError::Mismatch("no named_endpoints object"))?;

    match expected_endpoint {
        Some(endpoint) if !endpoints.contains_key(endpoint) => {
            Err(IdentityError::Mismatch("expected endpoint is not listed"))
        }
        _ => Ok(()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single HTTP request with `status_line` and `body`.
    async fn serve_once(status_line: &'static str, body: String) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        port
    }

    #[test]
    fn signature_accepts_listing_with_expected_endpoint() {
        let body = json!({"named_endpoints": {"/change_choices": {}, "/gen": {}}});
        assert!(matches_signature(&body, Some("/change_choices")).is_ok());
        assert!(matches_signature(&body, None).is_ok());
    }

    #[test]
    fn signature_rejects_missing_endpoint_or_wrong_shape() {
        let body = json!({"named_endpoints": {"/gen": {}}});
        assert!(matches!(
            matches_signature(&body, Some("/change_choices")),
            Err(IdentityError::Mismatch(_))
        ));

        let list = json!(["/change_choices"]);
        assert!(matches_signature(&list, None).is_err());

        let wrong_type = json!({"named_endpoints": ["/change_choices"]});
        assert!(matches_signature(&wrong_type, None).is_err());
    }

    #[test]
    fn url_has_exactly_one_leading_slash() {
        let check = HttpIdentityCheck::new(IdentityConfig {
            path: "info".to_string(),
            expected_endpoint: None,
        });
        assert_eq!(check.url(Ipv4Addr::new(10, 0, 0, 2), 7860), "http://10.0.0.2:7860/info");

        let check = HttpIdentityCheck::default();
        assert_eq!(check.url(Ipv4Addr::new(10, 0, 0, 2), 9000), "http://10.0.0.2:9000/info");
    }

    #[tokio::test]
    async fn confirm_accepts_matching_service() {
        let body = json!({"named_endpoints": {"/change_choices": {}}}).to_string();
        let port = serve_once("200 OK", body).await;

        let check = HttpIdentityCheck::new(IdentityConfig::default());
        let result = check.confirm(Ipv4Addr::LOCALHOST, port, Duration::from_secs(2)).await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[tokio::test]
    async fn confirm_rejects_error_status() {
        let port = serve_once("404 Not Found", "{}".to_string()).await;

        let check = HttpIdentityCheck::new(IdentityConfig::default());
        let result = check.confirm(Ipv4Addr::LOCALHOST, port, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(IdentityError::Status(StatusCode::NOT_FOUND))));
    }

    #[tokio::test]
    async fn confirm_rejects_non_json_body() {
        let port = serve_once("200 OK", "<html>hello</html>".to_string()).await;

        let check = HttpIdentityCheck::new(IdentityConfig::default());
        let result = check.confirm(Ipv4Addr::LOCALHOST, port, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(IdentityError::Request(_))));
    }
}
