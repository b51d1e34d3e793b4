//! ChatRPC - chat session client library for a JSON-RPC backend
//!
//! This library provides the client side of a chat application whose
//! sessions, messages, LLM providers and tool servers live behind a
//! JSON-RPC 2.0 service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `rpc`: JSON-RPC envelope types, the transport seam and the HTTP transport
//! - `service`: typed session procedures over the RPC client
//! - `session`: the stateful session controller and its domain types
//! - `registry`: cached provider and tool-server metadata
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface definition and handlers
//!
//! # Example
//!
//! ```no_run
//! use chatrpc::commands::Backend;
//! use chatrpc::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let backend = Backend::connect(config)?;
//!     let session = backend.controller.create("Planning", None, None, None).await?;
//!     backend.controller.set_provider(&session.id, "openai", "gpt-4").await;
//!     let reply = backend.controller.send("Hello").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod registry;
pub mod rpc;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatRpcError, ErrorCategory, Precondition, Result};
pub use registry::{ProviderRegistry, ServerRegistry};
pub use rpc::RpcClient;
pub use service::{RpcSessionService, SessionService};
pub use session::{Message, Session, SessionController};
