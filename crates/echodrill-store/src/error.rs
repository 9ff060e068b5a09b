//! Store error types

use thiserror::Error;

/// Plan storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record exists but cannot be decoded
    #[error("Corrupt plan record {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Data directory error
    #[error("Failed to access data directory: {0}")]
    DataDirectoryError(String),

    /// Serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
