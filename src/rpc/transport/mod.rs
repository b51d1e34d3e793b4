//! JSON-RPC transport abstraction and implementations
//!
//! This module defines the [`Transport`] trait used by
//! [`crate::rpc::client::RpcClient`]. Concrete implementations live in
//! submodules:
//!
//! - [`http::HttpTransport`] -- POSTs each request to the JSON-RPC endpoint
//!   and returns the response body.
//! - [`fake::FakeTransport`] -- in-process scripted fake used in tests
//!   (cfg(test) only).
//!
//! # Design
//!
//! The backend answers every POST with exactly one JSON-RPC response, so the
//! trait is a single request/response round-trip over serialized strings.
//! Envelope construction and error promotion belong to the client, not the
//! transport.

use crate::error::Result;

/// Abstraction over JSON-RPC transport implementations.
///
/// Implementations must be cheap to share behind an `Arc<dyn Transport>`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Deliver one serialized JSON-RPC request and return the raw response
    /// body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ChatRpcError::Transport`] if the request does
    /// not complete (connection failure, timeout, non-success HTTP status).
    async fn round_trip(&self, payload: String) -> Result<String>;
}

pub mod http;

#[cfg(test)]
pub mod fake;
