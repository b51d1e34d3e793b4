//! JSON-RPC implementation of [`SessionService`]

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ChatRpcError, Result};
use crate::rpc::RpcClient;
use crate::service::wire::{
    methods, ApiMessage, ApiSession, ChatWithToolsParams, CreateSessionParams,
    GenerateTitleParams, UpdateSessionResult,
};
use crate::service::SessionService;
use crate::session::types::SessionUpdate;

/// JSON-RPC code the backend uses for a missing session.
const NOT_FOUND_CODE: i64 = 404;

/// Session Service reached through an [`RpcClient`].
#[derive(Debug, Clone)]
pub struct RpcSessionService {
    client: Arc<RpcClient>,
}

impl RpcSessionService {
    /// Wrap a shared client.
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

/// Pull `key` out of an object result, or use the result itself when the
/// backend sent the bare value.
fn unwrap_field(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        ChatRpcError::InvalidResponse(format!("{} returned unexpected payload: {}", method, e))
            .into()
    })
}

fn success_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => map.get("success").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    }
}

fn map_not_found(err: anyhow::Error, session_id: &str) -> anyhow::Error {
    match err.downcast_ref::<ChatRpcError>() {
        Some(ChatRpcError::Rpc { code, .. }) if *code == NOT_FOUND_CODE => {
            ChatRpcError::NotFound(format!("session {}", session_id)).into()
        }
        _ => err,
    }
}

#[async_trait]
impl SessionService for RpcSessionService {
    async fn list_sessions(&self) -> Result<Vec<ApiSession>> {
        let value = self
            .client
            .call_value(methods::LIST_SESSIONS, json!({}))
            .await?;
        let rows = match unwrap_field(value, "sessions") {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        decode(methods::LIST_SESSIONS, rows)
    }

    async fn create_session(&self, params: CreateSessionParams) -> Result<ApiSession> {
        let value = self
            .client
            .call_value(methods::CREATE_SESSION, &params)
            .await?;
        match unwrap_field(value, "session") {
            row @ Value::Object(_) => decode(methods::CREATE_SESSION, row),
            _ => Err(ChatRpcError::InvalidResponse(
                "createSession returned no session object".to_string(),
            )
            .into()),
        }
    }

    async fn get_session(&self, session_id: &str) -> Result<ApiSession> {
        let value = self
            .client
            .call_value(methods::GET_SESSION, json!({ "id": session_id }))
            .await
            .map_err(|e| map_not_found(e, session_id))?;
        match unwrap_field(value, "session") {
            Value::Null => Err(ChatRpcError::NotFound(format!("session {}", session_id)).into()),
            row => decode(methods::GET_SESSION, row),
        }
    }

    async fn update_session(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<UpdateSessionResult> {
        let value = self
            .client
            .call_value(methods::UPDATE_SESSION, update.to_params(session_id))
            .await
            .map_err(|e| map_not_found(e, session_id))?;

        let success = value.get("success").and_then(Value::as_bool);
        let session = match value.get("session") {
            Some(row @ Value::Object(_)) => Some(decode(methods::UPDATE_SESSION, row.clone())?),
            _ => None,
        };
        Ok(UpdateSessionResult { success, session })
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let value = self
            .client
            .call_value(methods::DELETE_SESSION, json!({ "id": session_id }))
            .await
            .map_err(|e| map_not_found(e, session_id))?;
        Ok(success_flag(&value))
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ApiMessage>> {
        let value = self
            .client
            .call_value(methods::GET_MESSAGES, json!({ "session_id": session_id }))
            .await
            .map_err(|e| map_not_found(e, session_id))?;
        let rows = match unwrap_field(value, "messages") {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        decode(methods::GET_MESSAGES, rows)
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: &str,
        content: Value,
    ) -> Result<ApiMessage> {
        let value = self
            .client
            .call_value(
                methods::ADD_MESSAGE,
                json!({ "session_id": session_id, "role": role, "content": content }),
            )
            .await
            .map_err(|e| map_not_found(e, session_id))?;
        match unwrap_field(value, "message") {
            row @ Value::Object(_) => decode(methods::ADD_MESSAGE, row),
            _ => Err(ChatRpcError::InvalidResponse(
                "addMessage returned no message object".to_string(),
            )
            .into()),
        }
    }

    async fn clear_messages(&self, session_id: &str) -> Result<bool> {
        let value = self
            .client
            .call_value(methods::CLEAR_MESSAGES, json!({ "session_id": session_id }))
            .await
            .map_err(|e| map_not_found(e, session_id))?;
        Ok(success_flag(&value))
    }

    async fn generate_title(&self, params: GenerateTitleParams) -> Result<String> {
        let value = self
            .client
            .call_value(methods::GENERATE_TITLE, &params)
            .await?;
        let title = match unwrap_field(value, "title") {
            Value::String(s) => s.trim().to_string(),
            _ => String::new(),
        };
        if title.is_empty() {
            return Err(
                ChatRpcError::InvalidResponse("generate_title returned no title".to_string())
                    .into(),
            );
        }
        Ok(title)
    }

    async fn chat_with_tools(&self, params: ChatWithToolsParams) -> Result<Value> {
        self.client
            .call_value(methods::CHAT_WITH_TOOLS, &params)
            .await
    }
}
