//! Command handlers for the ChatRPC CLI
//!
//! Each submodule handles one top-level command. [`Backend`] wires the
//! configured HTTP transport into the session controller and the two
//! registries so handlers share one connection setup.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::registry::{ProviderRegistry, ServerRegistry};
use crate::rpc::transport::http::HttpTransport;
use crate::rpc::transport::Transport;
use crate::rpc::RpcClient;
use crate::service::RpcSessionService;
use crate::session::SessionController;

pub mod chat;
pub mod providers;
pub mod servers;
pub mod sessions;

/// Everything a command needs to talk to the backend.
#[derive(Debug)]
pub struct Backend {
    pub controller: SessionController,
    pub providers: ProviderRegistry,
    pub servers: Arc<ServerRegistry>,
    pub config: Config,
}

impl Backend {
    /// Build the HTTP transport from `config` and wire the components.
    ///
    /// No request is sent here.
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid endpoint, or an HTTP error if
    /// the client cannot be built
    pub fn connect(config: Config) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        tracing::debug!("Connecting to {}", endpoint);
        let transport = HttpTransport::new(
            endpoint,
            config.service.headers.clone(),
            Duration::from_secs(config.service.request_timeout_seconds),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Wire the components over an existing transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let client = Arc::new(RpcClient::new(transport));
        let service = Arc::new(RpcSessionService::new(Arc::clone(&client)));
        let controller = SessionController::new(service, config.controller_options());
        Self {
            controller,
            providers: ProviderRegistry::new(Arc::clone(&client)),
            servers: Arc::new(ServerRegistry::new(client)),
            config,
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Render epoch milliseconds as local wall-clock time.
pub(crate) fn format_millis(millis: i64) -> String {
    use chrono::TimeZone;

    chrono::Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
