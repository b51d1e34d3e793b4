//! Domain types held by the session controller

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a session's locally held fields match the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Matches the last authoritative copy
    #[default]
    Synced,
    /// Optimistically changed; the service has not answered yet
    Pending,
    /// Optimistically changed; the service failed or did not confirm
    Unconfirmed,
}

/// Delivery state of a message in the local log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Read back from the service
    #[default]
    Confirmed,
    /// Appended locally, waiting for the service
    Pending,
    /// Appended locally; the call that should persist it failed
    Failed,
}

/// One conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Service-assigned identifier
    pub id: String,
    /// Display name
    pub title: String,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Last update time, epoch milliseconds
    pub updated_at: i64,
    /// Provider messages are routed to
    pub llm_provider: Option<String>,
    /// Model messages are routed to
    pub llm_model: Option<String>,
    /// Tool server exposed during chat; `None` means no tools
    pub mcp_server_id: Option<String>,
    /// Advisory count cached by the service
    pub message_count: Option<u64>,
    /// Local pending tag
    #[serde(default)]
    pub sync: SyncState,
}

impl Session {
    /// Provider and model, when both are configured.
    pub fn llm_selection(&self) -> Option<(&str, &str)> {
        match (self.llm_provider.as_deref(), self.llm_model.as_deref()) {
            (Some(p), Some(m)) => Some((p, m)),
            _ => None,
        }
    }
}

/// One turn in a session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier
    pub id: String,
    /// Free-form role: user, assistant, system, tool
    pub role: String,
    /// Opaque content
    pub content: Value,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Tool-call records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    /// Local pending tag
    #[serde(default)]
    pub status: DeliveryStatus,
}

impl Message {
    /// Build the optimistic local copy of a user's outgoing turn.
    pub fn pending_user(content: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            role: "user".to_string(),
            content: Value::String(content.into()),
            timestamp: chrono::Utc::now().timestamp_millis(),
            tool_calls: None,
            status: DeliveryStatus::Pending,
        }
    }

    /// Flatten content to text.
    ///
    /// Strings are returned as-is, objects with a string `text` field yield
    /// that field, and anything else is rendered as JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrpc::session::Message;
    /// use serde_json::json;
    ///
    /// let mut msg = Message::pending_user("hello");
    /// assert_eq!(msg.content_text(), "hello");
    /// msg.content = json!({ "text": "from tool", "tool_call_id": "c1" });
    /// assert_eq!(msg.content_text(), "from tool");
    /// ```
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("text") {
                Some(Value::String(text)) => text.clone(),
                _ => self.content.to_string(),
            },
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// A partial update of a session; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// New title (sent as `name`)
    pub title: Option<String>,
    /// New provider
    pub llm_provider: Option<String>,
    /// New model
    pub llm_model: Option<String>,
    /// New tool server; `Some(None)` detaches the server
    pub mcp_server_id: Option<Option<String>>,
}

impl SessionUpdate {
    /// Update only the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Update provider and model together.
    pub fn llm(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            llm_provider: Some(provider.into()),
            llm_model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Attach or detach the tool server.
    pub fn server(server_id: Option<String>) -> Self {
        Self {
            mcp_server_id: Some(server_id),
            ..Default::default()
        }
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.llm_provider.is_none()
            && self.llm_model.is_none()
            && self.mcp_server_id.is_none()
    }

    /// Wire params for `sessions.updateSession`, including the `id`.
    ///
    /// A detached tool server is sent as an empty string, which the backend
    /// stores as "no server".
    pub fn to_params(&self, session_id: &str) -> Value {
        let mut params = serde_json::Map::new();
        params.insert("id".into(), Value::String(session_id.to_string()));
        if let Some(title) = &self.title {
            params.insert("name".into(), Value::String(title.clone()));
        }
        if let Some(provider) = &self.llm_provider {
            params.insert("llm_provider".into(), Value::String(provider.clone()));
        }
        if let Some(model) = &self.llm_model {
            params.insert("llm_model".into(), Value::String(model.clone()));
        }
        if let Some(server) = &self.mcp_server_id {
            params.insert(
                "mcp_server_id".into(),
                Value::String(server.clone().unwrap_or_default()),
            );
        }
        Value::Object(params)
    }
}
