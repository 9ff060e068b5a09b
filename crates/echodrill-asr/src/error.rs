//! ASR error types

use thiserror::Error;

/// Speech recognition errors
#[derive(Error, Debug)]
pub enum AsrError {
    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// File not found
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// Language detection failed
    #[error("Language detection failed: {0}")]
    DetectionFailed(String),

    /// Transcription failed
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
