//! Error types for the server.
//!
//! These cover assembly and serving only. Errors on the gate's request
//! path never surface to the client; they resolve to fail-open inside
//! the gate itself.

use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to construct the session-store client.
    #[error("Session store client error: {0}")]
    StoreClient(String),

    /// Internal server error (bind/serve failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
