//! JSON-RPC 2.0 envelope types
//!
//! The session backend speaks plain JSON-RPC 2.0 over HTTP POST. Only the
//! request and response envelopes are modelled here; payloads stay as
//! [`serde_json::Value`] until a typed layer decodes them.

use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request object.
///
/// # Examples
///
/// ```
/// use chatrpc::rpc::types::JsonRpcRequest;
///
/// let req = JsonRpcRequest::new(7, "sessions.listSessions", serde_json::json!({}));
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.id, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// The method name to invoke.
    pub method: String,
    /// Method parameters. Omitted from the wire when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Request correlation identifier.
    pub id: u64,
}

impl JsonRpcRequest {
    /// Build a request envelope. A `null` params value is dropped.
    pub fn new(id: u64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: if params.is_null() { None } else { Some(params) },
            id,
        }
    }
}

/// A JSON-RPC 2.0 response object.
///
/// Exactly one of `result` or `error` is expected. A response with neither
/// is read as a `null` result, which is what the backend sends for handlers
/// that return nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version identifier.
    #[serde(default)]
    pub jsonrpc: String,
    /// Mirrors the `id` from the corresponding request.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Successful result value.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error object.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code. The backend uses HTTP-like codes (404, 500)
    /// alongside the reserved `-326xx` range.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
