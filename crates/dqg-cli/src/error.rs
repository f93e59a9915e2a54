use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] dqg_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quote text provided")]
    EmptyContent,
    #[error("Edited quote text cannot be empty")]
    EmptyEditedContent,
    #[error("Quote ID cannot be empty")]
    EmptyQuoteId,
    #[error("Quote not found for id/prefix: {0}")]
    QuoteNotFound(String),
    #[error("{0}")]
    AmbiguousQuoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
