//! Error types for ChatRPC
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling. Public functions return
//! [`Result`], an `anyhow` alias; callers that need to branch on the kind of
//! failure downcast to [`ChatRpcError`] or use [`ErrorCategory::of`].

use thiserror::Error;

/// Main error type for ChatRPC operations
///
/// The variants fall into three families (see [`ErrorCategory`]):
/// local precondition failures raised before any network attempt, transport
/// failures where the remote call did not complete, and service-reported
/// failures where the call completed but the payload is an error or unusable.
#[derive(Error, Debug)]
pub enum ChatRpcError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote call did not complete (network, timeout, bad HTTP status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a JSON-RPC error object
    #[error("JSON-RPC error [{code}]: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message reported by the service
        message: String,
    },

    /// The service has no such entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// The call succeeded but returned data the client cannot use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local validation rejected the call before touching the network
    #[error("Precondition failed: {0}")]
    Precondition(#[from] Precondition),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reasons a call is rejected locally, before any network round-trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// A `send` is already awaiting its response
    #[error("a message is already being processed; wait for the response before sending again")]
    SendInFlight,

    /// No session is current
    #[error("no active session")]
    NoCurrentSession,

    /// The current session has no usable LLM provider
    #[error("select a valid LLM provider before sending a message")]
    MissingProvider,

    /// The current session has no usable LLM model
    #[error("select a valid LLM model before sending a message")]
    MissingModel,

    /// The requested session is not the loaded one
    #[error("session {0} is not loaded")]
    SessionNotLoaded(String),

    /// Not enough messages to derive anything meaningful
    #[error("at least {required} messages are needed, found {found}")]
    NotEnoughMessages {
        /// Minimum number of messages required
        required: usize,
        /// Number of messages available
        found: usize,
    },

    /// Provider is not present in the registry
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    /// Model is not offered by the provider
    #[error("provider {provider} does not offer model {model}")]
    UnknownModel {
        /// Provider name
        provider: String,
        /// Requested model
        model: String,
    },
}

/// Coarse classification of a failure, mirroring how callers react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected locally; nothing was sent
    Precondition,
    /// The remote call did not complete
    Transport,
    /// The call completed but the service reported failure or sent unusable data
    Service,
}

impl ErrorCategory {
    /// Classify an error produced anywhere in this crate.
    ///
    /// Errors that are not a [`ChatRpcError`] (or a bare `reqwest::Error`)
    /// are treated as service failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrpc::error::{ChatRpcError, ErrorCategory, Precondition};
    ///
    /// let err = anyhow::Error::from(ChatRpcError::Precondition(Precondition::SendInFlight));
    /// assert_eq!(ErrorCategory::of(&err), ErrorCategory::Precondition);
    /// ```
    pub fn of(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<ChatRpcError>() {
            return match e {
                ChatRpcError::Precondition(_) => ErrorCategory::Precondition,
                ChatRpcError::Transport(_) | ChatRpcError::Http(_) | ChatRpcError::Io(_) => {
                    ErrorCategory::Transport
                }
                _ => ErrorCategory::Service,
            };
        }
        if err.downcast_ref::<Precondition>().is_some() {
            return ErrorCategory::Precondition;
        }
        if err.downcast_ref::<reqwest::Error>().is_some() {
            return ErrorCategory::Transport;
        }
        ErrorCategory::Service
    }
}

/// Returns true when `err` is a [`ChatRpcError::NotFound`].
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ChatRpcError>(),
        Some(ChatRpcError::NotFound(_))
    )
}

/// Result type alias for ChatRPC operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
