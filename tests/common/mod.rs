//! Shared helpers for integration tests
//!
//! The backend is a `wiremock` server that answers JSON-RPC POSTs. Each
//! mock matches on the `method` field of the request body and echoes the
//! request id back in the response envelope.

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use chatrpc::commands::Backend;
use chatrpc::Config;

/// Path the JSON-RPC endpoint is mounted at.
pub const RPC_PATH: &str = "/api/v1/jsonrpc";

fn request_id(request: &Request) -> Value {
    serde_json::from_slice::<Value>(&request.body)
        .ok()
        .and_then(|body| body.get("id").cloned())
        .unwrap_or(Value::Null)
}

/// Answers with `{"result": <value>}`.
pub struct RpcResult(pub Value);

impl Respond for RpcResult {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": request_id(request),
            "result": self.0,
        }))
    }
}

/// Answers with `{"error": {code, message}}`.
#[allow(dead_code)]
pub struct RpcError(pub i64, pub &'static str);

impl Respond for RpcError {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": request_id(request),
            "error": { "code": self.0, "message": self.1 },
        }))
    }
}

/// A mock matching JSON-RPC requests for `rpc_method`.
#[allow(dead_code)]
pub fn rpc(rpc_method: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({ "method": rpc_method })))
}

/// Mount a mock answering every `rpc_method` call with `result`.
#[allow(dead_code)]
pub async fn mount_result(server: &MockServer, rpc_method: &str, result: Value) {
    rpc(rpc_method)
        .respond_with(RpcResult(result))
        .mount(server)
        .await;
}

/// Endpoint URL of `server`.
#[allow(dead_code)]
pub fn endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), RPC_PATH)
}

/// A backend wired to `server` with default settings.
#[allow(dead_code)]
pub fn backend_for(server: &MockServer) -> Backend {
    let mut config = Config::default();
    config.service.endpoint = endpoint(server);
    config.service.request_timeout_seconds = 5;
    Backend::connect(config).expect("backend should build")
}

/// JSON-RPC bodies the server received for `rpc_method`, in order.
#[allow(dead_code)]
pub async fn received(server: &MockServer, rpc_method: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter(|body| body["method"] == rpc_method)
        .collect()
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("chatrpc.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
