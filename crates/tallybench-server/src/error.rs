//! Error types for tallybench-server.

use thiserror::Error;

/// Result type for tallybench-server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while running the counting service.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A protocol-level failure on a client connection.
    #[error(transparent)]
    Protocol(#[from] tallybench_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
