//! Async JSON-RPC 2.0 client over a [`Transport`]
//!
//! [`RpcClient`] allocates request ids, serializes the envelope, hands it to
//! the transport, and promotes the response into a typed value or a
//! [`ChatRpcError`]:
//!
//! - transport failure -> [`ChatRpcError::Transport`]
//! - unparsable body -> [`ChatRpcError::Transport`] (the exchange did not
//!   complete as JSON-RPC)
//! - `error` object -> [`ChatRpcError::Rpc`]
//! - `result` that does not decode into the expected type ->
//!   [`ChatRpcError::InvalidResponse`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ChatRpcError, Result};
use crate::rpc::transport::Transport;
use crate::rpc::types::{JsonRpcRequest, JsonRpcResponse};

/// JSON-RPC 2.0 client.
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chatrpc::rpc::client::RpcClient;
/// use chatrpc::rpc::transport::http::HttpTransport;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let transport = HttpTransport::new(
///         url::Url::parse("http://localhost:8000/api/v1/jsonrpc")?,
///         HashMap::new(),
///         Duration::from_secs(30),
///     )?;
///     let client = RpcClient::new(Arc::new(transport));
///     let servers: serde_json::Value = client.call("mcp.get_servers", serde_json::json!({})).await?;
///     println!("{servers}");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client over `transport`. Request ids start at 1.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Call `method` and decode the result into `R`.
    ///
    /// # Errors
    ///
    /// See the module documentation for the mapping of failures.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let value = self.call_value(method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            ChatRpcError::InvalidResponse(format!("{} returned unexpected payload: {}", method, e))
                .into()
        })
    }

    /// Call `method` and return the raw `result` value (`Null` when absent).
    pub async fn call_value<P>(&self, method: &str, params: P) -> Result<serde_json::Value>
    where
        P: Serialize + Send,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, serde_json::to_value(params)?);
        let payload = serde_json::to_string(&request)?;

        tracing::debug!(id, method, "JSON-RPC request");
        let body = self.transport.round_trip(payload).await?;

        let response: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            ChatRpcError::Transport(format!("{} returned a non JSON-RPC body: {}", method, e))
        })?;

        if let Some(resp_id) = response.id.as_ref().and_then(|v| v.as_u64()) {
            if resp_id != id {
                tracing::warn!(expected = id, got = resp_id, method, "JSON-RPC response id mismatch");
            }
        }

        if let Some(err) = response.error {
            tracing::debug!(id, method, code = err.code, "JSON-RPC error response");
            return Err(ChatRpcError::Rpc {
                code: err.code,
                message: err.message,
            }
            .into());
        }

        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::rpc::transport::fake::{FakeReply, FakeTransport};
    use crate::rpc::transport::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_decodes_result() {
        let transport = FakeTransport::new(|method, _| {
            assert_eq!(method, "llm.get_providers");
            FakeReply::Result(json!([{ "name": "openai" }]))
        });
        let client = RpcClient::new(Arc::new(transport));

        let providers: Vec<serde_json::Value> =
            client.call("llm.get_providers", json!({})).await.unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0]["name"], "openai");
    }

    #[tokio::test]
    async fn test_rpc_error_is_promoted() {
        let transport = FakeTransport::new(|_, _| FakeReply::Error(404, "no such session".into()));
        let client = RpcClient::new(Arc::new(transport));

        let err = client
            .call_value("sessions.getSession", json!({ "id": "x" }))
            .await
            .unwrap_err();
        match err.downcast_ref::<ChatRpcError>() {
            Some(ChatRpcError::Rpc { code, message }) => {
                assert_eq!(*code, 404);
                assert_eq!(message, "no such session");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_transport_category() {
        let transport = FakeTransport::new(|_, _| FakeReply::TransportFailure("refused".into()));
        let client = RpcClient::new(Arc::new(transport));

        let err = client.call_value("mcp.get_servers", json!({})).await.unwrap_err();
        assert_eq!(ErrorCategory::of(&err), ErrorCategory::Transport);
    }

    #[tokio::test]
    async fn test_undecodable_result_is_invalid_response() {
        let transport = FakeTransport::new(|_, _| FakeReply::Result(json!("not a list")));
        let client = RpcClient::new(Arc::new(transport));

        let err = client
            .call::<_, Vec<String>>("mcp.get_servers", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatRpcError>(),
            Some(ChatRpcError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_increase_per_request() {
        let mut mock = MockTransport::new();
        let mut seen = Vec::new();
        mock.expect_round_trip().times(3).returning(move |payload| {
            let v: serde_json::Value = serde_json::from_str(&payload).unwrap();
            seen.push(v["id"].as_u64().unwrap());
            assert_eq!(v["jsonrpc"], "2.0");
            Ok(json!({ "jsonrpc": "2.0", "id": v["id"], "result": seen.clone() }).to_string())
        });
        let client = RpcClient::new(Arc::new(mock));

        client.call_value("a", json!({})).await.unwrap();
        client.call_value("b", json!({})).await.unwrap();
        let last = client.call_value("c", json!({})).await.unwrap();
        assert_eq!(last, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_garbage_body_is_transport_error() {
        let mut mock = MockTransport::new();
        mock.expect_round_trip()
            .returning(|_| Ok("<html>bad gateway</html>".to_string()));
        let client = RpcClient::new(Arc::new(mock));

        let err = client.call_value("a", json!({})).await.unwrap_err();
        assert_eq!(ErrorCategory::of(&err), ErrorCategory::Transport);
    }

    #[tokio::test]
    async fn test_missing_result_reads_as_null() {
        let mut mock = MockTransport::new();
        mock.expect_round_trip()
            .returning(|_| Ok(r#"{"jsonrpc":"2.0","id":1}"#.to_string()));
        let client = RpcClient::new(Arc::new(mock));

        let value = client.call_value("a", json!({})).await.unwrap();
        assert!(value.is_null());
    }
}
