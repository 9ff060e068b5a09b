//! Playback error types

use thiserror::Error;

/// Playback-related errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Audio file missing
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// Format the probe cannot read
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Audio could not be decoded
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Playback engine failure
    #[error("Playback engine error: {0}")]
    Engine(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<hound::Error> for PlaybackError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => PlaybackError::IoError(e),
            other => PlaybackError::Decode(other.to_string()),
        }
    }
}
