//! Core error types

use thiserror::Error;

/// Errors raised by the core data model
#[derive(Error, Debug)]
pub enum CoreError {
    /// A composite key string could not be parsed
    #[error("Invalid segment key: {0}")]
    InvalidKey(String),

    /// Transcript JSON could not be decoded
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(#[from] serde_json::Error),
}
