//! Bridge errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Fatal: the listen address could not be bound. Everything else is
    /// session-local and handled inside the session.
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
