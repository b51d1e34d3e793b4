//! Provider and tool-server metadata
//!
//! - `providers` -- [`ProviderRegistry`]: configured LLM providers and their
//!   models, used to validate a session's routing before sending
//! - `servers`   -- [`ServerRegistry`]: tool servers, their connection state
//!   and tools, with an optional periodic status check

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod providers;
pub mod servers;

pub use providers::{Provider, ProviderRegistry, ProviderStatus};
pub use servers::{ServerRegistry, ServerStatus, ServerTool, ToolServer};

/// Outcome of a connect / test call as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    /// Whether the backend considers the call successful
    #[serde(default)]
    pub success: bool,
    /// Human-readable detail
    #[serde(default)]
    pub message: Option<String>,
    /// Extra data, e.g. tool counts after a server test
    #[serde(default)]
    pub details: Option<Value>,
}

impl ConnectionReport {
    /// A failed report carrying `message`, for calls that did not complete.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            details: None,
        }
    }
}
