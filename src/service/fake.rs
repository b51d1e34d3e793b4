//! In-memory Session Service for controller tests
//!
//! Beyond storing sessions and messages, the fake can
//! - record every call with its params,
//! - fail the next call of a method,
//! - hold calls of a method at a [`Gate`] until the test releases them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};

use crate::error::{ChatRpcError, Result};
use crate::service::wire::{
    methods, ApiMessage, ApiSession, ChatWithToolsParams, CreateSessionParams,
    GenerateTitleParams, UpdateSessionResult,
};
use crate::service::SessionService;
use crate::session::types::SessionUpdate;

/// Parks calls of one method until released.
#[derive(Debug)]
pub struct Gate {
    release: Semaphore,
    entered: Notify,
}

impl Gate {
    fn new() -> Self {
        Self {
            release: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    /// Let one parked (or future) call through.
    pub fn release(&self) {
        self.release.add_permits(1);
    }

    /// Wait until a call has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

/// A scripted failure for the next call of a method.
#[derive(Debug, Clone)]
pub enum FakeFailure {
    /// The call does not complete
    Transport,
    /// The service answers with an error object
    Rpc(i64),
}

#[derive(Debug)]
struct FakeState {
    sessions: Vec<ApiSession>,
    messages: HashMap<String, Vec<ApiMessage>>,
    calls: Vec<(String, Value)>,
    failures: HashMap<String, FakeFailure>,
    next_id: u64,
    update_returns_session: bool,
    authoritative_title: Option<String>,
    generated_title: String,
    inline_messages: bool,
}

/// In-memory [`SessionService`].
#[derive(Debug)]
pub struct FakeSessionService {
    state: Mutex<FakeState>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl Default for FakeSessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSessionService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                sessions: Vec::new(),
                messages: HashMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                next_id: 1,
                update_returns_session: true,
                authoritative_title: None,
                generated_title: "Generated Title".to_string(),
                inline_messages: false,
            }),
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake service lock")
    }

    /// Seed a session row and its messages.
    pub fn seed(&self, row: ApiSession, messages: Vec<ApiMessage>) {
        let mut state = self.state();
        if let Some(id) = row.id.clone() {
            state.messages.insert(id, messages);
        }
        state.sessions.push(row);
    }

    /// Seed a session with the given provider and model and `n` messages.
    pub fn seed_session(&self, id: &str, provider: Option<&str>, model: Option<&str>, n: usize) {
        let row = ApiSession {
            id: Some(id.to_string()),
            name: Some(format!("Session {}", id)),
            llm_provider: provider.map(str::to_string),
            llm_model: model.map(str::to_string),
            created_at: Some(json!(1_700_000_000)),
            ..Default::default()
        };
        let messages = (0..n)
            .map(|i| ApiMessage {
                id: Some(format!("{}-m{}", id, i)),
                role: Some(if i % 2 == 0 { "user" } else { "assistant" }.to_string()),
                content: json!(format!("message {}", i)),
                timestamp: Some(json!(1_700_000_000 + i as i64)),
                tool_calls: None,
            })
            .collect();
        self.seed(row, messages);
    }

    /// Stored messages of a session.
    pub fn stored_messages(&self, session_id: &str) -> Vec<ApiMessage> {
        self.state()
            .messages
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state().calls.clone()
    }

    /// Number of calls made to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|(m, _)| m == method).count()
    }

    /// Params of the most recent call to `method`.
    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.state()
            .calls
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }

    /// Fail the next call of `method`.
    pub fn fail_next(&self, method: &str, failure: FakeFailure) {
        self.state().failures.insert(method.to_string(), failure);
    }

    /// Make updates answer without a session object.
    pub fn set_update_returns_session(&self, yes: bool) {
        self.state().update_returns_session = yes;
    }

    /// Make updates store and return `title` regardless of what was asked.
    pub fn set_authoritative_title(&self, title: Option<&str>) {
        self.state().authoritative_title = title.map(str::to_string);
    }

    /// Title returned by `generate_title`.
    pub fn set_generated_title(&self, title: &str) {
        self.state().generated_title = title.to_string();
    }

    /// Embed messages in `get_session` responses.
    pub fn set_inline_messages(&self, yes: bool) {
        self.state().inline_messages = yes;
    }

    /// Hold calls of `method` until released through the returned gate.
    pub fn hold(&self, method: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        self.gates
            .lock()
            .expect("fake gate lock")
            .insert(method.to_string(), gate.clone());
        gate
    }

    async fn enter(&self, method: &str, params: Value) -> Result<()> {
        self.state().calls.push((method.to_string(), params));

        let gate = self
            .gates
            .lock()
            .expect("fake gate lock")
            .get(method)
            .cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.release.acquire().await {
                permit.forget();
            }
        }

        match self.state().failures.remove(method) {
            Some(FakeFailure::Transport) => {
                Err(ChatRpcError::Transport("connection refused".to_string()).into())
            }
            Some(FakeFailure::Rpc(code)) => Err(ChatRpcError::Rpc {
                code,
                message: "scripted failure".to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn find(&self, session_id: &str) -> Result<ApiSession> {
        self.state()
            .sessions
            .iter()
            .find(|s| s.id.as_deref() == Some(session_id))
            .cloned()
            .ok_or_else(|| ChatRpcError::NotFound(format!("session {}", session_id)).into())
    }

    fn push_message(&self, session_id: &str, role: &str, content: Value) -> ApiMessage {
        let mut state = self.state();
        let id = format!("srv-{}", state.next_id);
        state.next_id += 1;
        let message = ApiMessage {
            id: Some(id),
            role: Some(role.to_string()),
            content,
            timestamp: Some(json!(chrono::Utc::now().timestamp())),
            tool_calls: None,
        };
        state
            .messages
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }
}

#[async_trait]
impl SessionService for FakeSessionService {
    async fn list_sessions(&self) -> Result<Vec<ApiSession>> {
        self.enter(methods::LIST_SESSIONS, json!({})).await?;
        Ok(self.state().sessions.clone())
    }

    async fn create_session(&self, params: CreateSessionParams) -> Result<ApiSession> {
        self.enter(methods::CREATE_SESSION, serde_json::to_value(&params)?)
            .await?;
        let mut state = self.state();
        let id = format!("sess-{}", state.next_id);
        state.next_id += 1;
        let row = ApiSession {
            id: Some(id.clone()),
            name: Some(params.title),
            llm_provider: params.llm_provider,
            llm_model: params.llm_model,
            mcp_server_id: params.mcp_server_id,
            created_at: Some(json!(chrono::Utc::now().timestamp())),
            message_count: Some(0),
            ..Default::default()
        };
        state.sessions.push(row.clone());
        state.messages.insert(id, Vec::new());
        Ok(row)
    }

    async fn get_session(&self, session_id: &str) -> Result<ApiSession> {
        self.enter(methods::GET_SESSION, json!({ "id": session_id }))
            .await?;
        let mut row = self.find(session_id)?;
        if self.state().inline_messages {
            row.messages = Some(self.stored_messages(session_id));
        }
        Ok(row)
    }

    async fn update_session(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<UpdateSessionResult> {
        self.enter(methods::UPDATE_SESSION, update.to_params(session_id))
            .await?;
        let mut state = self.state();
        let authoritative = state.authoritative_title.clone();
        let returns_session = state.update_returns_session;
        let row = state
            .sessions
            .iter_mut()
            .find(|s| s.id.as_deref() == Some(session_id))
            .ok_or_else(|| ChatRpcError::NotFound(format!("session {}", session_id)))?;
        if let Some(title) = authoritative.or_else(|| update.title.clone()) {
            row.name = Some(title);
        }
        if let Some(provider) = &update.llm_provider {
            row.llm_provider = Some(provider.clone());
        }
        if let Some(model) = &update.llm_model {
            row.llm_model = Some(model.clone());
        }
        if let Some(server) = &update.mcp_server_id {
            row.mcp_server_id = server.clone();
        }
        Ok(UpdateSessionResult {
            success: None,
            session: returns_session.then(|| row.clone()),
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        self.enter(methods::DELETE_SESSION, json!({ "id": session_id }))
            .await?;
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id.as_deref() != Some(session_id));
        state.messages.remove(session_id);
        Ok(state.sessions.len() < before)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ApiMessage>> {
        self.enter(methods::GET_MESSAGES, json!({ "session_id": session_id }))
            .await?;
        Ok(self.stored_messages(session_id))
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: &str,
        content: Value,
    ) -> Result<ApiMessage> {
        self.enter(
            methods::ADD_MESSAGE,
            json!({ "session_id": session_id, "role": role, "content": content }),
        )
        .await?;
        self.find(session_id)?;
        Ok(self.push_message(session_id, role, content))
    }

    async fn clear_messages(&self, session_id: &str) -> Result<bool> {
        self.enter(methods::CLEAR_MESSAGES, json!({ "session_id": session_id }))
            .await?;
        self.find(session_id)?;
        self.state()
            .messages
            .insert(session_id.to_string(), Vec::new());
        Ok(true)
    }

    async fn generate_title(&self, params: GenerateTitleParams) -> Result<String> {
        self.enter(methods::GENERATE_TITLE, serde_json::to_value(&params)?)
            .await?;
        Ok(self.state().generated_title.clone())
    }

    async fn chat_with_tools(&self, params: ChatWithToolsParams) -> Result<Value> {
        self.enter(methods::CHAT_WITH_TOOLS, serde_json::to_value(&params)?)
            .await?;
        self.find(&params.session_id)?;
        self.push_message(&params.session_id, "user", json!(params.user_message));
        let reply = self.push_message(
            &params.session_id,
            "assistant",
            json!(format!("echo: {}", params.user_message)),
        );
        Ok(json!({ "message": reply }))
    }
}
