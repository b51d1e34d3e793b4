//! Tool-server registry
//!
//! Caches the backend's tool servers and which of them are connected. The
//! status check can run periodically on a background task:
//!
//! ```text
//!   start_periodic_check(interval)
//!        |
//!        v
//!   tick (immediately, then every interval) --> fetch_with_tools()
//!        ^                                          |
//!        +------------------------------------------+
//!   stop_periodic_check() / drop --> token cancelled --> task exits
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::registry::ConnectionReport;
use crate::rpc::RpcClient;

/// JSON-RPC method names of the server registry.
pub mod methods {
    pub const GET_SERVERS: &str = "mcp.get_servers";
    pub const GET_CONNECTED_SERVERS: &str = "mcp.get_connected_servers";
    pub const GET_SERVERS_WITH_TOOLS: &str = "mcp.get_servers_with_tools";
    pub const CONNECT_SERVER: &str = "mcp.connect_server";
    pub const DISCONNECT_SERVER: &str = "mcp.disconnect_server";
    pub const TEST_SERVER_CONNECTION: &str = "mcp.test_server_connection";
    pub const SETUP_SAMPLING_CALLBACK: &str = "mcp.setup_sampling_callback";
    pub const CREATE_SERVER: &str = "mcp.create_server";
    pub const UPDATE_SERVER: &str = "mcp.update_server";
    pub const DELETE_SERVER: &str = "mcp.delete_server";
}

/// Default interval of the periodic status check (15 minutes)
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Connection state of a tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Error,
    Connecting,
    #[default]
    #[serde(other)]
    Offline,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
            ServerStatus::Error => "error",
            ServerStatus::Connecting => "connecting",
        };
        write!(f, "{}", s)
    }
}

/// One tool exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// A tool server known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `stdio` or `sse`
    #[serde(rename = "type", default)]
    pub server_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default, alias = "error_message", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ServerTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_count: Option<u64>,
}

impl ToolServer {
    fn normalise(mut self) -> Self {
        if self.error.as_deref().is_some_and(|e| e.trim().is_empty()) {
            self.error = None;
        }
        self
    }
}

#[derive(Debug, Default)]
struct ServerState {
    servers: Vec<ToolServer>,
    connected: Vec<String>,
    last_checked: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Cached view of the backend's tool servers.
#[derive(Debug)]
pub struct ServerRegistry {
    client: Arc<RpcClient>,
    state: RwLock<ServerState>,
    periodic: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl ServerRegistry {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            state: RwLock::new(ServerState::default()),
            periodic: Mutex::new(None),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }

    fn view<R>(&self, f: impl FnOnce(&ServerState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn set_status(&self, server_id: &str, status: ServerStatus, error: Option<String>) {
        self.update(|state| {
            if let Some(server) = state.servers.iter_mut().find(|s| s.id == server_id) {
                server.status = status;
                server.error = error;
            }
        });
    }

    pub fn servers(&self) -> Vec<ToolServer> {
        self.view(|s| s.servers.clone())
    }

    pub fn get(&self, server_id: &str) -> Option<ToolServer> {
        self.view(|s| s.servers.iter().find(|srv| srv.id == server_id).cloned())
    }

    /// Ids of servers currently connected.
    pub fn connected(&self) -> Vec<String> {
        self.view(|s| s.connected.clone())
    }

    pub fn is_connected(&self, server_id: &str) -> bool {
        self.view(|s| s.connected.iter().any(|id| id == server_id))
    }

    /// When `fetch_with_tools` last succeeded.
    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.view(|s| s.last_checked)
    }

    pub fn last_error(&self) -> Option<String> {
        self.view(|s| s.last_error.clone())
    }

    /// Refresh the server list. On failure the cache is emptied.
    pub async fn fetch(&self) -> Vec<ToolServer> {
        let fetched = match self
            .client
            .call::<_, Value>(methods::GET_SERVERS, json!({}))
            .await
        {
            Ok(Value::Array(rows)) => {
                let servers: Vec<ToolServer> = rows
                    .into_iter()
                    .filter_map(|row| serde_json::from_value::<ToolServer>(row).ok())
                    .map(ToolServer::normalise)
                    .collect();
                self.update(|s| s.last_error = None);
                servers
            }
            Ok(other) => {
                tracing::warn!("Server list was not an array: {}", other);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load tool servers: {:#}", e);
                self.update(|s| s.last_error = Some(e.to_string()));
                Vec::new()
            }
        };
        self.update(|s| s.servers = fetched.clone());
        fetched
    }

    /// Refresh the connected set. The cache keeps its previous value on
    /// failure.
    pub async fn fetch_connected(&self) -> Vec<String> {
        match self
            .client
            .call_value(methods::GET_CONNECTED_SERVERS, json!({}))
            .await
        {
            Ok(value) => {
                let ids: Vec<String> = value
                    .get("servers")
                    .and_then(Value::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                self.update(|s| {
                    for server in s.servers.iter_mut() {
                        if ids.contains(&server.id) {
                            server.status = ServerStatus::Online;
                        }
                    }
                    s.connected = ids.clone();
                    s.last_error = None;
                });
                ids
            }
            Err(e) => {
                tracing::warn!("Failed to load connected servers: {:#}", e);
                self.update(|s| s.last_error = Some(e.to_string()));
                self.connected()
            }
        }
    }

    /// Refresh servers together with their status and tools.
    pub async fn fetch_with_tools(&self) -> Vec<ToolServer> {
        let value = match self
            .client
            .call_value(methods::GET_SERVERS_WITH_TOOLS, json!({}))
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to check tool servers: {:#}", e);
                self.update(|s| s.last_error = Some(e.to_string()));
                return self.servers();
            }
        };
        let Some(rows) = value.get("servers").and_then(Value::as_array) else {
            tracing::debug!("Status check returned no servers");
            return self.servers();
        };
        let servers: Vec<ToolServer> = rows
            .iter()
            .filter_map(|row| serde_json::from_value::<ToolServer>(row.clone()).ok())
            .map(ToolServer::normalise)
            .collect();
        let online = servers
            .iter()
            .filter(|s| s.status == ServerStatus::Online)
            .count();
        self.update(|s| {
            s.connected = servers
                .iter()
                .filter(|srv| srv.status == ServerStatus::Online)
                .map(|srv| srv.id.clone())
                .collect();
            s.servers = servers.clone();
            s.last_checked = Some(Utc::now());
            s.last_error = None;
        });
        tracing::info!(total = servers.len(), online, "Tool server status refreshed");
        servers
    }

    /// Ask the backend to connect a server.
    pub async fn connect(&self, server_id: &str) -> ConnectionReport {
        self.set_status(server_id, ServerStatus::Connecting, None);
        let report = self
            .report(methods::CONNECT_SERVER, json!({ "server_id": server_id }))
            .await;
        if report.success {
            self.set_status(server_id, ServerStatus::Online, None);
            self.update(|s| {
                if !s.connected.iter().any(|id| id == server_id) {
                    s.connected.push(server_id.to_string());
                }
            });
            tracing::info!(server_id, "Connected tool server");
        } else {
            let reason = report
                .message
                .clone()
                .unwrap_or_else(|| "connection failed".to_string());
            tracing::warn!(server_id, "Failed to connect tool server: {}", reason);
            self.set_status(server_id, ServerStatus::Error, Some(reason));
        }
        report
    }

    /// Ask the backend to disconnect a server.
    pub async fn disconnect(&self, server_id: &str) -> bool {
        let report = self
            .report(methods::DISCONNECT_SERVER, json!({ "server_id": server_id }))
            .await;
        if report.success {
            self.set_status(server_id, ServerStatus::Offline, None);
            self.update(|s| s.connected.retain(|id| id != server_id));
            tracing::info!(server_id, "Disconnected tool server");
        }
        report.success
    }

    /// Test a server's connection; a successful test with details refreshes
    /// its tool list.
    pub async fn test_connection(&self, server_id: &str) -> ConnectionReport {
        self.set_status(server_id, ServerStatus::Connecting, None);
        let report = self
            .report(methods::TEST_SERVER_CONNECTION, json!({ "server_id": server_id }))
            .await;
        if report.success {
            let tools: Option<Vec<ServerTool>> = report
                .details
                .as_ref()
                .and_then(|d| d.get("tools"))
                .and_then(|t| serde_json::from_value(t.clone()).ok());
            self.update(|s| {
                if let Some(server) = s.servers.iter_mut().find(|srv| srv.id == server_id) {
                    server.status = ServerStatus::Online;
                    server.error = None;
                    if let Some(tools) = tools {
                        server.tools = tools;
                    }
                }
            });
        } else {
            self.set_status(server_id, ServerStatus::Error, report.message.clone());
        }
        report
    }

    /// Let a server sample from `provider_name` through the backend.
    pub async fn setup_sampling_callback(&self, server_id: &str, provider_name: &str) -> bool {
        self.report(
            methods::SETUP_SAMPLING_CALLBACK,
            json!({ "server_id": server_id, "provider_name": provider_name }),
        )
        .await
        .success
    }

    /// Register a server, then refresh the list.
    pub async fn create(&self, server: &ToolServer) -> Result<()> {
        let mut params = serde_json::to_value(server)?;
        if let Value::Object(map) = &mut params {
            map.remove("status");
            map.remove("tools");
            if server.id.is_empty() {
                map.remove("id");
            }
        }
        self.client
            .call_value(methods::CREATE_SERVER, params)
            .await?;
        tracing::info!(server = %server.name, "Created tool server");
        self.fetch().await;
        Ok(())
    }

    /// Replace a server's settings, then refresh the list.
    pub async fn update_server(&self, server_id: &str, server: &ToolServer) -> Result<()> {
        let mut params = serde_json::to_value(server)?;
        if let Value::Object(map) = &mut params {
            map.remove("status");
            map.remove("tools");
            map.remove("id");
            map.insert("server_id".to_string(), Value::String(server_id.to_string()));
        }
        self.client
            .call_value(methods::UPDATE_SERVER, params)
            .await?;
        tracing::info!(server_id, "Updated tool server");
        self.fetch().await;
        Ok(())
    }

    /// Delete a server and drop it from the cache.
    pub async fn delete(&self, server_id: &str) -> Result<()> {
        self.client
            .call_value(methods::DELETE_SERVER, json!({ "server_id": server_id }))
            .await?;
        self.update(|s| {
            s.servers.retain(|srv| srv.id != server_id);
            s.connected.retain(|id| id != server_id);
        });
        tracing::info!(server_id, "Deleted tool server");
        Ok(())
    }

    async fn report(&self, method: &str, params: Value) -> ConnectionReport {
        match self.client.call_value(method, params).await {
            Ok(Value::Bool(success)) => ConnectionReport {
                success,
                ..Default::default()
            },
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => ConnectionReport::failed(e.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Periodic status check
    // ------------------------------------------------------------------

    /// Run `fetch_with_tools` now and then every `interval`, replacing any
    /// check already running.
    pub fn start_periodic_check(self: &Arc<Self>, interval: Duration) {
        self.stop_periodic_check();

        let token = CancellationToken::new();
        let cancellation = token.clone();
        let registry: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;

                    _ = cancellation.cancelled() => break,

                    _ = ticker.tick() => {
                        let Some(registry) = registry.upgrade() else {
                            break;
                        };
                        registry.fetch_with_tools().await;
                    }
                }
            }
            tracing::debug!("Periodic tool server check stopped");
        });

        tracing::info!(interval_secs = interval.as_secs(), "Started periodic tool server check");
        *self.periodic.lock().unwrap_or_else(PoisonError::into_inner) = Some((token, handle));
    }

    /// Stop the periodic check, if running.
    pub fn stop_periodic_check(&self) {
        if let Some((token, _handle)) = self
            .periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }

    pub fn is_checking(&self) -> bool {
        self.periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }
}

impl Drop for ServerRegistry {
    fn drop(&mut self) {
        self.stop_periodic_check();
    }
}
