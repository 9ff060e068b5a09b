//! Speech recognition glue
//!
//! The recognizer itself is pluggable. This crate owns the language table,
//! "auto" language resolution and the conversion of recognizer tokens into
//! the word timings the rest of echodrill works with.

pub mod error;
pub mod hint;
pub mod languages;
pub mod recognizer;
pub mod words;

pub use error::AsrError;
pub use hint::{transcribe_with_hint, HintConfig, LanguageHint};
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use recognizer::{RecognizedToken, SpeechRecognizer};
pub use words::merge_tokens_into_words;

// Re-export types from echodrill-core
pub use echodrill_core::{Transcript, WordTiming};
