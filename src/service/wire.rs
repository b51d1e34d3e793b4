//! Wire payloads of the Session Service
//!
//! These structs mirror what the backend sends and accepts. They are
//! deliberately loose (everything optional, timestamps as raw JSON) because
//! the backend is inconsistent about shapes; [`crate::session::convert`]
//! turns them into the strict domain types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC method names of the Session Service.
pub mod methods {
    /// List session summaries
    pub const LIST_SESSIONS: &str = "sessions.listSessions";
    /// Create a session
    pub const CREATE_SESSION: &str = "sessions.createSession";
    /// Fetch one session (optionally with messages)
    pub const GET_SESSION: &str = "sessions.getSession";
    /// Partial update of a session
    pub const UPDATE_SESSION: &str = "sessions.updateSession";
    /// Delete a session
    pub const DELETE_SESSION: &str = "sessions.deleteSession";
    /// List the messages of a session
    pub const GET_MESSAGES: &str = "sessions.getMessages";
    /// Append one message to a session
    pub const ADD_MESSAGE: &str = "sessions.addMessage";
    /// Clear all messages of a session
    pub const CLEAR_MESSAGES: &str = "sessions.clearMessages";
    /// Derive a title from a few messages
    pub const GENERATE_TITLE: &str = "sessions.generate_title";
    /// Combined LLM + tool-server chat turn
    pub const CHAT_WITH_TOOLS: &str = "chat.with_tools";
}

/// A session row as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSession {
    /// Session identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name (preferred over `title`)
    #[serde(default)]
    pub name: Option<String>,
    /// Display name as stored by the backend
    #[serde(default)]
    pub title: Option<String>,
    /// Creation time: epoch seconds, epoch millis, or ISO-8601 string
    #[serde(default)]
    pub created_at: Option<Value>,
    /// Last update time, same encodings as `created_at`
    #[serde(default)]
    pub updated_at: Option<Value>,
    /// Configured LLM provider
    #[serde(default)]
    pub llm_provider: Option<String>,
    /// Configured LLM model
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Configured tool server
    #[serde(default)]
    pub mcp_server_id: Option<String>,
    /// Cached message count
    #[serde(default)]
    pub message_count: Option<u64>,
    /// Inline messages, present on some `getSession` responses
    #[serde(default)]
    pub messages: Option<Vec<ApiMessage>>,
}

/// A message row as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Message identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Free-form role: user, assistant, system, tool
    #[serde(default)]
    pub role: Option<String>,
    /// Opaque content (string or structured)
    #[serde(default)]
    pub content: Value,
    /// Timestamp, same encodings as session timestamps
    #[serde(default)]
    pub timestamp: Option<Value>,
    /// Tool-call records attached to the message
    #[serde(default, alias = "toolCalls")]
    pub tool_calls: Option<Vec<Value>>,
}

/// Params of `sessions.createSession`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionParams {
    /// Initial title
    pub title: String,
    /// LLM provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    /// LLM model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Tool server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_server_id: Option<String>,
}

/// Result of `sessions.updateSession`.
///
/// The backend sends `{session}`; older deployments also send `success`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSessionResult {
    /// Explicit success flag, when the backend sends one
    pub success: Option<bool>,
    /// Authoritative session after the update
    pub session: Option<ApiSession>,
}

/// One `{role, content}` pair handed to title generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMessage {
    /// Message role
    pub role: String,
    /// Flattened text content
    pub content: String,
}

/// Params of `sessions.generate_title`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTitleParams {
    /// Session the title is for
    pub session_id: String,
    /// Leading messages of the session
    pub messages: Vec<TitleMessage>,
    /// Provider used to generate
    pub provider_name: String,
    /// Model used to generate
    pub model: String,
}

/// Params of `chat.with_tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatWithToolsParams {
    /// Target session
    pub session_id: String,
    /// The user's turn
    pub user_message: String,
    /// Provider to route to
    pub provider_name: String,
    /// Model to route to
    pub model: String,
    /// Tool server exposed to the model; omitted when the turn has no tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_params_omit_absent_server() {
        let params = ChatWithToolsParams {
            session_id: "s".into(),
            user_message: "hi".into(),
            provider_name: "openai".into(),
            model: "gpt-4".into(),
            server_id: None,
        };
        let val = serde_json::to_value(&params).unwrap();
        assert!(val.get("server_id").is_none());
        assert_eq!(val["user_message"], "hi");
        assert_eq!(val["provider_name"], "openai");
    }

    #[test]
    fn test_message_accepts_camel_case_tool_calls() {
        let msg: ApiMessage = serde_json::from_str(
            r#"{"id":"m1","role":"assistant","content":"x","timestamp":1,"toolCalls":[{"name":"ls"}]}"#,
        )
        .unwrap();
        assert_eq!(msg.tool_calls.unwrap().len(), 1);
    }
}
