//! In-process fake transport for unit tests
//!
//! [`FakeTransport`] decodes each outbound JSON-RPC request, hands the method
//! name and params to a scripted handler, and wraps the handler's answer in a
//! response envelope. Every request is recorded so tests can assert on what
//! went over the wire.
//!
//! ```text
//! RpcClient --round_trip()--> FakeTransport --(method, params)--> handler
//!                                   ^                                |
//!                                   +------ result / error ----------+
//! ```

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::error::{ChatRpcError, Result};
use crate::rpc::transport::Transport;

/// What a scripted handler answers for one request.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Respond with `{"result": value}`
    Result(Value),
    /// Respond with `{"error": {"code", "message"}}`
    Error(i64, String),
    /// Fail the round-trip itself
    TransportFailure(String),
}

type Handler = Box<dyn Fn(&str, &Value) -> FakeReply + Send + Sync>;

/// Scripted in-process transport.
pub struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<(String, Value)>>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}

impl FakeTransport {
    /// Create a fake that answers every request with `handler(method, params)`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All `(method, params)` pairs received so far, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().expect("fake transport lock").clone()
    }

    /// Number of requests made for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .expect("fake transport lock")
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn round_trip(&self, payload: String) -> Result<String> {
        let request: Value = serde_json::from_str(&payload)?;
        let method = request["method"].as_str().unwrap_or_default().to_string();
        let params = request.get("params").cloned().unwrap_or(Value::Null);
        let id = request["id"].clone();

        self.requests
            .lock()
            .expect("fake transport lock")
            .push((method.clone(), params.clone()));

        let body = match (self.handler)(&method, &params) {
            FakeReply::Result(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            FakeReply::Error(code, message) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message }
            }),
            FakeReply::TransportFailure(reason) => {
                return Err(ChatRpcError::Transport(reason).into());
            }
        };

        Ok(body.to_string())
    }
}
