//! Session Interaction Controller
//!
//! [`SessionController`] owns the client-side state of chat sessions: the
//! session list, the current session and its message log, busy flags, the
//! last error per category and the advisory inactivity timeout. All remote
//! work goes through a [`SessionService`].
//!
//! # Concurrency
//!
//! `send` is single-flight across the controller: a second call while one is
//! outstanding fails with [`Precondition::SendInFlight`] before any network
//! call. Public `fetch_messages` calls are dropped while another fetch holds
//! the fetch lane. Other operations interleave freely and the later response
//! overwrites shared state.
//!
//! State is kept behind a synchronous lock that is never held across an
//! await, so optimistic writes are visible as soon as the returned future is
//! first polled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::Value;

use crate::error::{ChatRpcError, Precondition, Result};
use crate::service::wire::{
    ChatWithToolsParams, CreateSessionParams, GenerateTitleParams, TitleMessage,
};
use crate::service::SessionService;
use crate::session::activity::ActivityTracker;
use crate::session::convert::{
    clean_identifier, message_from_api, messages_from_api, session_from_api,
};
use crate::session::flight::FlightGuard;
use crate::session::types::{DeliveryStatus, Message, Session, SessionUpdate, SyncState};

/// Default inactivity window (5 minutes)
pub const DEFAULT_INACTIVITY_WINDOW: Duration = Duration::from_millis(300_000);

/// Tunables of a [`SessionController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Title used when none is given or the service sends none
    pub default_title: String,
    /// Idle time after which the timeout flag flips
    pub inactivity_window: Duration,
    /// How many leading messages title generation sees
    pub title_context_messages: usize,
    /// Minimum number of messages before a title can be generated
    pub title_min_messages: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            default_title: "New Session".to_string(),
            inactivity_window: DEFAULT_INACTIVITY_WINDOW,
            title_context_messages: 10,
            title_min_messages: 2,
        }
    }
}

/// Last error message per category; `None` means the last attempt succeeded.
///
/// `list` covers session list and metadata operations, `messages` covers
/// loading, fetching, appending and clearing, `response` covers `send` and
/// title generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerErrors {
    pub list: Option<String>,
    pub messages: Option<String>,
    pub response: Option<String>,
}

/// What a message fetch did to the local log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The log differed and was replaced
    Replaced,
    /// The fetched log equals the held one; nothing changed
    Unchanged,
    /// Another fetch was in flight; this call did nothing
    Dropped,
    /// The session stopped being current before the response arrived
    Stale,
    /// The fetch failed; the error is recorded
    Failed,
}

/// Point-in-time copy of everything the controller owns.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub sessions: Vec<Session>,
    pub current: Option<Session>,
    pub messages: Vec<Message>,
    pub errors: ControllerErrors,
    pub list_loading: bool,
    pub sending: bool,
    pub messages_loading: bool,
    pub response_loading: bool,
    pub timed_out: bool,
}

#[derive(Debug, Default)]
struct ControllerState {
    sessions: Vec<Session>,
    current: Option<Session>,
    messages: Vec<Message>,
    errors: ControllerErrors,
}

impl ControllerState {
    fn is_current(&self, session_id: &str) -> bool {
        self.current.as_ref().is_some_and(|s| s.id == session_id)
    }

    /// Apply `f` to the current session and the list entry with `session_id`.
    fn for_each_copy(&mut self, session_id: &str, mut f: impl FnMut(&mut Session)) {
        if let Some(current) = self.current.as_mut().filter(|s| s.id == session_id) {
            f(current);
        }
        if let Some(listed) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            f(listed);
        }
    }
}

/// The Session Interaction Controller.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatrpc::rpc::RpcClient;
/// use chatrpc::rpc::transport::http::HttpTransport;
/// use chatrpc::service::RpcSessionService;
/// use chatrpc::session::{ControllerOptions, SessionController};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let transport = HttpTransport::new(
///         url::Url::parse("http://localhost:8000/api/v1/jsonrpc")?,
///         Default::default(),
///         std::time::Duration::from_secs(30),
///     )?;
///     let service = RpcSessionService::new(Arc::new(RpcClient::new(Arc::new(transport))));
///     let controller = SessionController::new(Arc::new(service), ControllerOptions::default());
///
///     controller
///         .create("Demo", Some("openai"), Some("gpt-4"), None)
///         .await?;
///     controller.send("hello").await?;
///     for message in controller.messages() {
///         println!("{}: {}", message.role, message.content_text());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SessionController {
    service: Arc<dyn SessionService>,
    options: ControllerOptions,
    state: RwLock<ControllerState>,
    list_loading: AtomicBool,
    sending: AtomicBool,
    messages_loading: AtomicBool,
    response_loading: AtomicBool,
    fetch_lane: tokio::sync::Mutex<()>,
    activity: ActivityTracker,
}

fn precondition(reason: Precondition) -> anyhow::Error {
    ChatRpcError::Precondition(reason).into()
}

impl SessionController {
    /// Create a controller with empty state.
    pub fn new(service: Arc<dyn SessionService>, options: ControllerOptions) -> Self {
        let activity = ActivityTracker::new(options.inactivity_window);
        Self {
            service,
            options,
            state: RwLock::new(ControllerState::default()),
            list_loading: AtomicBool::new(false),
            sending: AtomicBool::new(false),
            messages_loading: AtomicBool::new(false),
            response_loading: AtomicBool::new(false),
            fetch_lane: tokio::sync::Mutex::new(()),
            activity,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ControllerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ControllerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn convert(&self, row: &crate::service::ApiSession) -> Result<Session> {
        session_from_api(row, &self.options.default_title).ok_or_else(|| {
            ChatRpcError::InvalidResponse("session payload has no id".to_string()).into()
        })
    }

    /// Replace every local copy of `session` with the authoritative one.
    fn adopt(&self, session: &Session) {
        let mut state = self.write();
        state.for_each_copy(&session.id, |local| *local = session.clone());
    }

    // ------------------------------------------------------------------
    // Session list and metadata
    // ------------------------------------------------------------------

    /// Fetch all session summaries and replace the local list.
    ///
    /// On failure the previous list is kept, the error is recorded and
    /// `None` is returned.
    pub async fn list(&self) -> Option<Vec<Session>> {
        let _loading = FlightGuard::mark(&self.list_loading);
        match self.service.list_sessions().await {
            Ok(rows) => {
                let sessions: Vec<Session> = rows
                    .iter()
                    .filter_map(|row| session_from_api(row, &self.options.default_title))
                    .collect();
                if sessions.len() < rows.len() {
                    tracing::warn!(
                        skipped = rows.len() - sessions.len(),
                        "Ignoring session rows without an id"
                    );
                }
                {
                    let mut state = self.write();
                    state.sessions = sessions.clone();
                    state.errors.list = None;
                }
                self.activity.touch();
                tracing::debug!(count = sessions.len(), "Session list refreshed");
                Some(sessions)
            }
            Err(e) => {
                tracing::warn!("Failed to list sessions: {:#}", e);
                self.write().errors.list = Some(e.to_string());
                None
            }
        }
    }

    /// Create a session, make it current and put it at the head of the list.
    ///
    /// A blank `title` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Propagates transport and service errors. A response without a usable
    /// session id is [`ChatRpcError::InvalidResponse`].
    pub async fn create(
        &self,
        title: &str,
        provider: Option<&str>,
        model: Option<&str>,
        server_id: Option<&str>,
    ) -> Result<Session> {
        let title = match title.trim() {
            "" => self.options.default_title.clone(),
            t => t.to_string(),
        };
        let params = CreateSessionParams {
            title,
            llm_provider: clean_identifier(provider),
            llm_model: clean_identifier(model),
            mcp_server_id: clean_identifier(server_id),
        };

        let created = match self.service.create_session(params).await {
            Ok(row) => self.convert(&row),
            Err(e) => Err(e),
        };
        let session = match created {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to create session: {:#}", e);
                self.write().errors.list = Some(e.to_string());
                return Err(e);
            }
        };

        {
            let mut state = self.write();
            state.sessions.retain(|s| s.id != session.id);
            state.sessions.insert(0, session.clone());
            state.current = Some(session.clone());
            state.messages.clear();
            state.errors.list = None;
        }
        self.activity.touch();
        tracing::info!(session_id = %session.id, title = %session.title, "Created session");
        Ok(session)
    }

    /// Load one session and make it current.
    ///
    /// Inline messages in the response are adopted directly; otherwise the
    /// log is fetched separately.
    ///
    /// # Errors
    ///
    /// [`ChatRpcError::NotFound`] when the service has no such session,
    /// transport errors otherwise.
    pub async fn load(&self, session_id: &str) -> Result<Session> {
        let row = match self.service.get_session(session_id).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(session_id, "Failed to load session: {:#}", e);
                self.write().errors.messages = Some(e.to_string());
                return Err(e);
            }
        };
        let session = self.convert(&row)?;

        {
            let mut state = self.write();
            let switching = !state.is_current(&session.id);
            state.current = Some(session.clone());
            state.for_each_copy(&session.id, |local| *local = session.clone());
            if let Some(inline) = &row.messages {
                state.messages = messages_from_api(inline);
            } else if switching {
                state.messages.clear();
            }
            state.errors.messages = None;
        }
        self.activity.touch();
        tracing::debug!(session_id, inline = row.messages.is_some(), "Loaded session");

        if row.messages.is_none() {
            let _lane = self.fetch_lane.lock().await;
            self.fetch_locked(session_id).await;
        }
        Ok(session)
    }

    /// Rename a session optimistically.
    ///
    /// The new title is visible before the service answers. An authoritative
    /// session in the response replaces the local copy. On failure the title
    /// stays as written, tagged [`SyncState::Unconfirmed`], and the current
    /// session is reloaded.
    pub async fn rename(&self, session_id: &str, title: &str) -> bool {
        let title = title.trim().to_string();
        if title.is_empty() {
            tracing::warn!(session_id, "Refusing to rename session to a blank title");
            return false;
        }
        self.write().for_each_copy(session_id, |local| {
            local.title = title.clone();
            local.sync = SyncState::Pending;
        });

        let outcome = self
            .service
            .update_session(session_id, &SessionUpdate::title(title.clone()))
            .await;
        match outcome {
            Ok(result) if result.success != Some(false) => {
                match result
                    .session
                    .as_ref()
                    .and_then(|row| session_from_api(row, &self.options.default_title))
                {
                    Some(authoritative) => {
                        if authoritative.title != title {
                            tracing::info!(
                                session_id,
                                requested = %title,
                                stored = %authoritative.title,
                                "Service kept a different title"
                            );
                        }
                        self.adopt(&authoritative);
                    }
                    None => {
                        tracing::debug!(session_id, "Rename accepted without a session copy");
                        self.write().for_each_copy(session_id, |local| {
                            local.sync = SyncState::Unconfirmed;
                        });
                    }
                }
                self.write().errors.list = None;
                true
            }
            Ok(_) => {
                self.rename_failed(session_id, "service rejected the rename".to_string())
                    .await
            }
            Err(e) => self.rename_failed(session_id, e.to_string()).await,
        }
    }

    async fn rename_failed(&self, session_id: &str, reason: String) -> bool {
        tracing::warn!(session_id, "Rename failed: {}", reason);
        {
            let mut state = self.write();
            state.for_each_copy(session_id, |local| local.sync = SyncState::Unconfirmed);
            state.errors.list = Some(reason);
        }
        let is_current = self.read().is_current(session_id);
        if is_current {
            self.refresh_current().await;
        }
        false
    }

    /// Generic partial update.
    ///
    /// Succeeds only when the response carries an authoritative session,
    /// which then replaces the local copies.
    pub async fn update(&self, session_id: &str, update: SessionUpdate) -> bool {
        if update.is_empty() {
            tracing::debug!(session_id, "Empty update, nothing to send");
            return false;
        }
        let result = match self.service.update_session(session_id, &update).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(session_id, "Failed to update session: {:#}", e);
                self.write().errors.list = Some(e.to_string());
                return false;
            }
        };

        let authoritative = result
            .session
            .as_ref()
            .filter(|_| result.success != Some(false))
            .and_then(|row| session_from_api(row, &self.options.default_title));
        match authoritative {
            Some(session) => {
                self.adopt(&session);
                self.write().errors.list = None;
                tracing::info!(session_id, "Updated session");
                true
            }
            None => {
                tracing::warn!(session_id, "Update response carried no session");
                self.write().errors.list =
                    Some("update response carried no session".to_string());
                false
            }
        }
    }

    /// Route a session to `provider` / `model`.
    ///
    /// Blank or sentinel values are rejected without a network call.
    pub async fn set_provider(&self, session_id: &str, provider: &str, model: &str) -> bool {
        let (Some(provider), Some(model)) = (
            clean_identifier(Some(provider)),
            clean_identifier(Some(model)),
        ) else {
            tracing::warn!(session_id, "Refusing to set an empty provider or model");
            return false;
        };
        self.update(session_id, SessionUpdate::llm(provider, model))
            .await
    }

    /// Attach a tool server, or detach it with `None`.
    pub async fn set_server(&self, session_id: &str, server_id: Option<&str>) -> bool {
        self.update(session_id, SessionUpdate::server(clean_identifier(server_id)))
            .await
    }

    /// Delete a session.
    ///
    /// On confirmed success the session leaves the list, and if it was
    /// current, the current session and message log are cleared.
    pub async fn remove(&self, session_id: &str) -> bool {
        match self.service.delete_session(session_id).await {
            Ok(true) => {
                let mut state = self.write();
                state.sessions.retain(|s| s.id != session_id);
                if state.is_current(session_id) {
                    state.current = None;
                    state.messages.clear();
                }
                state.errors.list = None;
                drop(state);
                tracing::info!(session_id, "Deleted session");
                true
            }
            Ok(false) => {
                tracing::warn!(session_id, "Service did not confirm the delete");
                self.write().errors.list = Some("delete was not confirmed".to_string());
                false
            }
            Err(e) => {
                tracing::warn!(session_id, "Failed to delete session: {:#}", e);
                self.write().errors.list = Some(e.to_string());
                false
            }
        }
    }

    /// Reload the current session, if any.
    ///
    /// Used as the compensating action after failed writes. Returns whether
    /// the reload succeeded.
    pub async fn refresh_current(&self) -> bool {
        let current_id = self.read().current.as_ref().map(|s| s.id.clone());
        match current_id {
            Some(id) => self.load(&id).await.is_ok(),
            None => false,
        }
    }

    /// Derive a title from the first messages of the loaded session.
    ///
    /// Never fails past this call: every error is logged, recorded and
    /// turned into `false`. Nothing is sent unless the session is current,
    /// has a provider and model, and has enough messages.
    pub async fn generate_title(&self, session_id: &str) -> bool {
        let loaded = {
            let state = self.read();
            state
                .current
                .as_ref()
                .filter(|s| s.id == session_id)
                .map(|s| (s.clone(), state.messages.clone()))
        };
        let Some((session, messages)) = loaded else {
            self.title_rejected(Precondition::SessionNotLoaded(session_id.to_string()));
            return false;
        };
        let Some((provider, model)) = session.llm_selection() else {
            let reason = if session.llm_provider.is_none() {
                Precondition::MissingProvider
            } else {
                Precondition::MissingModel
            };
            self.title_rejected(reason);
            return false;
        };
        if messages.len() < self.options.title_min_messages {
            self.title_rejected(Precondition::NotEnoughMessages {
                required: self.options.title_min_messages,
                found: messages.len(),
            });
            return false;
        }

        let params = GenerateTitleParams {
            session_id: session_id.to_string(),
            messages: messages
                .iter()
                .take(self.options.title_context_messages)
                .map(|m| TitleMessage {
                    role: m.role.clone(),
                    content: m.content_text(),
                })
                .collect(),
            provider_name: provider.to_string(),
            model: model.to_string(),
        };

        match self.service.generate_title(params).await {
            Ok(title) => {
                tracing::info!(session_id, title = %title, "Generated session title");
                self.rename(session_id, &title).await
            }
            Err(e) => {
                tracing::error!(session_id, "Title generation failed: {:#}", e);
                self.write().errors.response = Some(e.to_string());
                self.refresh_current().await;
                false
            }
        }
    }

    fn title_rejected(&self, reason: Precondition) {
        tracing::debug!("Not generating a title: {}", reason);
        self.write().errors.response = Some(ChatRpcError::from(reason).to_string());
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Refetch the message log of `session_id`.
    ///
    /// Dropped while another fetch is in flight. The log is replaced only
    /// when the fetched one differs.
    pub async fn fetch_messages(&self, session_id: &str) -> FetchOutcome {
        let Ok(_lane) = self.fetch_lane.try_lock() else {
            tracing::debug!(session_id, "Message fetch already in flight, dropping");
            return FetchOutcome::Dropped;
        };
        self.fetch_locked(session_id).await
    }

    /// Fetch with the lane already held by the caller.
    async fn fetch_locked(&self, session_id: &str) -> FetchOutcome {
        let _loading = FlightGuard::mark(&self.messages_loading);
        let rows = match self.service.list_messages(session_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(session_id, "Failed to fetch messages: {:#}", e);
                self.write().errors.messages = Some(e.to_string());
                return FetchOutcome::Failed;
            }
        };
        let fresh = messages_from_api(&rows);

        let outcome = {
            let mut state = self.write();
            if !state.is_current(session_id) {
                tracing::debug!(session_id, "Discarding messages of a session no longer current");
                return FetchOutcome::Stale;
            }
            state.errors.messages = None;
            if state.messages == fresh {
                FetchOutcome::Unchanged
            } else {
                state.messages = fresh;
                FetchOutcome::Replaced
            }
        };
        self.activity.touch();
        outcome
    }

    /// Send one user turn through the combined chat-with-tools call.
    ///
    /// The user message is appended locally before the call; whatever
    /// happens, the log is refetched afterwards so it reflects what the
    /// service persisted.
    ///
    /// # Errors
    ///
    /// Precondition failures, checked in order: a send already in flight, no
    /// current session, no provider, no model. Nothing is sent in those
    /// cases. A failed chat call is returned after the refetch.
    pub async fn send(&self, content: &str) -> Result<Value> {
        let Some(_flight) = FlightGuard::try_acquire(&self.sending) else {
            tracing::debug!("Send rejected, another send is in flight");
            return Err(precondition(Precondition::SendInFlight));
        };

        let target = {
            let state = self.read();
            match state.current.as_ref() {
                None => Err(Precondition::NoCurrentSession),
                Some(session) => {
                    match (
                        clean_identifier(session.llm_provider.as_deref()),
                        clean_identifier(session.llm_model.as_deref()),
                    ) {
                        (None, _) => Err(Precondition::MissingProvider),
                        (_, None) => Err(Precondition::MissingModel),
                        (Some(provider), Some(model)) => Ok((
                            session.id.clone(),
                            provider,
                            model,
                            clean_identifier(session.mcp_server_id.as_deref()),
                        )),
                    }
                }
            }
        };
        let (session_id, provider, model, server_id) = match target {
            Ok(target) => target,
            Err(reason) => {
                self.write().errors.response = Some(ChatRpcError::from(reason.clone()).to_string());
                return Err(precondition(reason));
            }
        };

        let pending = Message::pending_user(content);
        let pending_id = pending.id.clone();
        {
            let mut state = self.write();
            state.messages.push(pending);
            state.errors.response = None;
        }
        self.activity.touch();

        let _responding = FlightGuard::mark(&self.response_loading);
        tracing::info!(
            session_id = %session_id,
            provider = %provider,
            model = %model,
            tools = server_id.is_some(),
            "Sending message"
        );
        let params = ChatWithToolsParams {
            session_id: session_id.clone(),
            user_message: content.to_string(),
            provider_name: provider,
            model,
            server_id,
        };
        let result = self.service.chat_with_tools(params).await;

        if let Err(e) = &result {
            tracing::error!(session_id = %session_id, "Chat call failed: {:#}", e);
            let mut state = self.write();
            state.errors.response = Some(e.to_string());
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == pending_id) {
                message.status = DeliveryStatus::Failed;
            }
        }

        let _lane = self.fetch_lane.lock().await;
        let outcome = self.fetch_locked(&session_id).await;
        tracing::debug!(session_id = %session_id, ?outcome, "Reconciled log after send");

        result
    }

    /// Clear the message log of a session on the service.
    ///
    /// Returns the service's confirmation; the local log is emptied only
    /// when confirmed and the session is current.
    pub async fn clear(&self, session_id: &str) -> Result<bool> {
        let confirmed = match self.service.clear_messages(session_id).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!(session_id, "Failed to clear messages: {:#}", e);
                self.write().errors.messages = Some(e.to_string());
                return Err(e);
            }
        };
        if confirmed {
            {
                let mut state = self.write();
                if state.is_current(session_id) {
                    state.messages.clear();
                }
                state.errors.messages = None;
            }
            self.activity.touch();
            tracing::info!(session_id, "Cleared messages");
        } else {
            tracing::warn!(session_id, "Service did not confirm clearing messages");
            self.write().errors.messages = Some("clear was not confirmed".to_string());
        }
        Ok(confirmed)
    }

    /// Append one message through the append procedure.
    ///
    /// The stored message is added to the local log when the session is
    /// current.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: &str,
        content: Value,
    ) -> Result<Message> {
        let row = match self.service.append_message(session_id, role, content).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(session_id, "Failed to append message: {:#}", e);
                self.write().errors.messages = Some(e.to_string());
                return Err(e);
            }
        };
        let message = message_from_api(&row);
        {
            let mut state = self.write();
            if state.is_current(session_id) && !state.messages.iter().any(|m| m.id == message.id)
            {
                state.messages.push(message.clone());
            }
        }
        self.activity.touch();
        Ok(message)
    }

    // ------------------------------------------------------------------
    // Inactivity
    // ------------------------------------------------------------------

    /// Compare idle time against the window now. Always `false` without a
    /// current session.
    pub fn check_timeout(&self) -> bool {
        if self.read().current.is_none() {
            return false;
        }
        self.activity.check()
    }

    /// Record activity without performing an operation.
    pub fn reset_timeout(&self) {
        self.activity.touch();
    }

    pub fn is_timed_out(&self) -> bool {
        self.activity.is_timed_out()
    }

    /// Stop the inactivity timer. The controller stays usable.
    pub fn shutdown(&self) {
        self.activity.cancel();
        tracing::debug!("Session controller shut down");
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn sessions(&self) -> Vec<Session> {
        self.read().sessions.clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.read().current.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    pub fn errors(&self) -> ControllerErrors {
        self.read().errors.clone()
    }

    /// Forget all recorded errors.
    pub fn clear_errors(&self) {
        self.write().errors = ControllerErrors::default();
    }

    pub fn is_list_loading(&self) -> bool {
        self.list_loading.load(Ordering::Acquire)
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    pub fn is_messages_loading(&self) -> bool {
        self.messages_loading.load(Ordering::Acquire)
    }

    pub fn is_response_loading(&self) -> bool {
        self.response_loading.load(Ordering::Acquire)
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Copy of all owned state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.read();
        ControllerSnapshot {
            sessions: state.sessions.clone(),
            current: state.current.clone(),
            messages: state.messages.clone(),
            errors: state.errors.clone(),
            list_loading: self.is_list_loading(),
            sending: self.is_sending(),
            messages_loading: self.is_messages_loading(),
            response_loading: self.is_response_loading(),
            timed_out: self.is_timed_out(),
        }
    }
}
