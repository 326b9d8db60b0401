//! Error types for resplink
//!
//! Only `Connection`, `Protocol` and `ServerFatal` are ever raised out of a
//! reply reader. Ordinary `-ERR` replies and codec failures degrade to
//! sentinel values so that batches can complete.

use std::fmt;

use thiserror::Error;

/// Result type alias using RespError
pub type Result<T> = std::result::Result<T, RespError>;

/// Privileged server error categories that abort even inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// `MASTERDOWN`: replica is syncing with its master or the link is down
    MasterDown,
    /// `LOADING`: the server is loading its dataset in memory
    Loading,
    /// `NOAUTH`: the connection is not authenticated
    NoAuth,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FatalKind::MasterDown => "SYNC with master in progress or master down",
            FatalKind::Loading => "server is loading the dataset",
            FatalKind::NoAuth => "failed to AUTH connection",
        };
        f.write_str(text)
    }
}

/// Unified error type for resplink operations
#[derive(Debug, Error)]
pub enum RespError {
    // -------------------------------------------------------------------------
    // Raised failures
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error ({kind}): {message}")]
    ServerFatal { kind: FatalKind, message: String },

    // -------------------------------------------------------------------------
    // Recovered locally by the reply readers
    // -------------------------------------------------------------------------
    /// An ordinary error reply, handed out by `Connection::take_error`
    #[error("Server error: {0}")]
    Server(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Everything else
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RespError {
    /// Protocol error for an unexpected reply-type byte
    pub fn unexpected_byte(byte: u8) -> Self {
        RespError::Protocol(format!(
            "got '{}' as reply type byte",
            char::from(byte).escape_default()
        ))
    }
}
