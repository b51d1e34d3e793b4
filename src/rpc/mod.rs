//! JSON-RPC 2.0 plumbing for the session backend
//!
//! # Module Layout
//!
//! - `types`     -- request / response / error envelopes
//! - `client`    -- [`client::RpcClient`], id allocation and error promotion
//! - `transport` -- [`transport::Transport`] trait with HTTP and fake
//!   implementations

pub mod client;
pub mod transport;
pub mod types;

pub use client::RpcClient;
pub use transport::Transport;
