//! Error types for tallybench-core.

use thiserror::Error;

/// Result type for tallybench-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tallybench-core.
#[derive(Debug, Error)]
pub enum Error {
    /// The counting service could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No service is bound under the requested name.
    #[error("no service bound under name '{0}'")]
    Lookup(String),

    /// The remote operation itself failed.
    #[error("invocation failed: {0}")]
    Invocation(String),

    /// The OS could not create a child process.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle operation was called in the wrong process state.
    #[error("invalid process state: {0}")]
    ProcessState(String),

    /// A blocking wait was disturbed before producing a result.
    #[error("wait interrupted: {0}")]
    Interrupted(String),

    /// A wire or report message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An argument or operation selector was rejected.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
