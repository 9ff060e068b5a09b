//! Speech-to-text engine contract

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AsrError;

/// One timed token as emitted by a recognizer
///
/// Tokens are often sub-word pieces; a piece starting with whitespace opens a
/// new word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedToken {
    pub text: String,
    pub start: f64,
    pub end: f64,
    /// Token probability (0.0 - 1.0)
    #[serde(default)]
    pub probability: f32,
}

impl RecognizedToken {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            probability: 1.0,
        }
    }
}

/// A speech recognizer producing timed tokens
#[trait_variant::make(SpeechRecognizer: Send)]
pub trait LocalSpeechRecognizer {
    /// Recognize an audio file, optionally forcing a recognizer language code
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Vec<RecognizedToken>, AsrError>;

    /// Detect the spoken language from the first `clip_seconds` of audio
    async fn detect_language(&self, audio: &Path, clip_seconds: f64) -> Result<String, AsrError>;
}
