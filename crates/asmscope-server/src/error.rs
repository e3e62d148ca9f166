//! Error types for asmscope server.

use std::path::PathBuf;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// IO error.
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// asmscope core error.
    #[error("Core error: {0}")]
    Core(#[from] asmscope_core::Error),

    /// The front-end compiler could not be built; nothing can be served.
    #[error("Compiler not ready: {0}")]
    Build(#[from] asmscope_core::BuildError),

    /// Host/port did not form a socket address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            message: e.to_string(),
        }
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
