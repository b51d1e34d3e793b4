//! Session Service contract
//!
//! [`SessionService`] is the remote store of sessions and messages that the
//! controller drives. [`rpc::RpcSessionService`] speaks it over JSON-RPC;
//! tests use the in-memory `fake::FakeSessionService`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod rpc;
pub mod wire;

#[cfg(test)]
pub mod fake;

pub use rpc::RpcSessionService;
pub use wire::{
    ApiMessage, ApiSession, ChatWithToolsParams, CreateSessionParams, GenerateTitleParams,
    TitleMessage, UpdateSessionResult,
};

use crate::session::types::SessionUpdate;

/// Remote operations on sessions and their messages.
///
/// Every method is one round-trip. Implementations map "no such session" to
/// [`crate::error::ChatRpcError::NotFound`] and a payload lacking required
/// fields to [`crate::error::ChatRpcError::InvalidResponse`].
#[async_trait]
pub trait SessionService: Send + Sync + std::fmt::Debug {
    /// All session summaries.
    async fn list_sessions(&self) -> Result<Vec<ApiSession>>;

    /// Create a session; the returned row carries the assigned id.
    async fn create_session(&self, params: CreateSessionParams) -> Result<ApiSession>;

    /// One session, possibly with inline messages.
    async fn get_session(&self, session_id: &str) -> Result<ApiSession>;

    /// Partial update.
    async fn update_session(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<UpdateSessionResult>;

    /// Delete a session. Returns the service's success flag.
    async fn delete_session(&self, session_id: &str) -> Result<bool>;

    /// Message log of a session, in append order.
    async fn list_messages(&self, session_id: &str) -> Result<Vec<ApiMessage>>;

    /// Append one message.
    async fn append_message(&self, session_id: &str, role: &str, content: Value)
        -> Result<ApiMessage>;

    /// Clear the message log. Returns the service's success flag.
    async fn clear_messages(&self, session_id: &str) -> Result<bool>;

    /// Generate a title from a few messages.
    async fn generate_title(&self, params: GenerateTitleParams) -> Result<String>;

    /// One chat turn with optional tool access. The payload is opaque.
    async fn chat_with_tools(&self, params: ChatWithToolsParams) -> Result<Value>;
}
