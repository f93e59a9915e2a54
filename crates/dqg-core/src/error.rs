//! Error types for dqg-core

use thiserror::Error;

/// Result type alias using dqg-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dqg-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Persistence gateway unavailable (quota exceeded, disabled, unwritable)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote source returned a non-success status or could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed JSON input
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed JSON with the wrong shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Quote or conflict not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A reconciliation pass is already running
    #[error("Sync already in progress")]
    SyncInProgress,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from talking to the remote source.
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(_))
    }
}
