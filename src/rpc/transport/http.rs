//! HTTP transport for the JSON-RPC endpoint
//!
//! Every request is sent as an HTTP POST with `Content-Type:
//! application/json`. The response body is returned verbatim for the client
//! to decode. Static headers (for example an `Authorization` bearer token)
//! are attached to every request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ChatRpcError, Result};
use crate::rpc::transport::Transport;

/// HTTP POST transport.
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use std::time::Duration;
/// use chatrpc::rpc::transport::http::HttpTransport;
///
/// let transport = HttpTransport::new(
///     url::Url::parse("http://localhost:8000/api/v1/jsonrpc").unwrap(),
///     HashMap::new(),
///     Duration::from_secs(30),
/// )
/// .unwrap();
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    /// Underlying reqwest HTTP client.
    http_client: Arc<reqwest::Client>,
    /// JSON-RPC endpoint URL (POST target).
    endpoint: url::Url,
    /// Static extra headers merged into every request.
    headers: HashMap<String, String>,
}

impl HttpTransport {
    /// Construct a new [`HttpTransport`] targeting `endpoint`.
    ///
    /// The `timeout` applies to each individual HTTP request. No network I/O
    /// is performed at construction time.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRpcError::Http`] if the reqwest client cannot be built
    /// (TLS backend initialisation failure).
    pub fn new(
        endpoint: url::Url,
        headers: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatRpcError::Http)?;

        Ok(Self {
            http_client: Arc::new(http_client),
            endpoint,
            headers,
        })
    }

    /// The endpoint this transport posts to.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, payload: String) -> Result<String> {
        let mut req = self
            .http_client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(payload);

        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let response = req.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "failed" };
            ChatRpcError::Transport(format!("POST {} {}: {}", self.endpoint, kind, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, endpoint = %self.endpoint, "JSON-RPC endpoint returned error status");
            return Err(ChatRpcError::Transport(format!(
                "POST {} returned HTTP {}",
                self.endpoint, status
            ))
            .into());
        }

        response.text().await.map_err(|e| {
            ChatRpcError::Transport(format!("failed to read response body: {}", e)).into()
        })
    }
}
