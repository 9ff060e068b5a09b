//! Language selection for a transcription

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use echodrill_core::segmenter::join_words;
use echodrill_core::Transcript;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AsrError;
use crate::languages::Language;
use crate::recognizer::SpeechRecognizer;
use crate::words::merge_tokens_into_words;

/// Language the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageHint {
    /// Detect from the audio
    #[default]
    Auto,
    /// A user language code from the language table
    Fixed(String),
}

impl FromStr for LanguageHint {
    type Err = AsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        Language::get(s)
            .map(|l| Self::Fixed(l.code.to_string()))
            .ok_or_else(|| AsrError::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(code) => f.write_str(code),
        }
    }
}

/// Auto-detection settings
#[derive(Debug, Clone)]
pub struct HintConfig {
    /// Length of the leading clip used for detection (seconds)
    pub detect_clip_seconds: f64,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            detect_clip_seconds: 30.0,
        }
    }
}

/// Transcribe with the language resolved once up front
///
/// `Auto` detects the language from a leading clip and then forces it for the
/// full pass. A failed or unsupported detection falls back to letting the
/// recognizer pick.
pub async fn transcribe_with_hint<R: SpeechRecognizer>(
    recognizer: &R,
    audio: &Path,
    hint: &LanguageHint,
    config: &HintConfig,
) -> Result<Transcript, AsrError> {
    if !audio.exists() {
        return Err(AsrError::FileNotFound(audio.display().to_string()));
    }

    let language = match hint {
        LanguageHint::Fixed(code) => Some(
            Language::get(code)
                .ok_or_else(|| AsrError::UnsupportedLanguage(code.clone()))?,
        ),
        LanguageHint::Auto => {
            match recognizer
                .detect_language(audio, config.detect_clip_seconds)
                .await
            {
                Ok(code) => match Language::get(&code) {
                    Some(language) => {
                        info!("Detected language: {}", language.code);
                        Some(language)
                    }
                    None => {
                        warn!("Detected unsupported language {}, not forcing one", code);
                        None
                    }
                },
                Err(e) => {
                    warn!("Language detection failed, not forcing one: {}", e);
                    None
                }
            }
        }
    };

    let tokens = recognizer
        .transcribe(audio, language.map(|l| l.recognizer_code))
        .await?;
    let words = merge_tokens_into_words(&tokens);
    info!("Recognized {} words from {} tokens", words.len(), tokens.len());

    Ok(Transcript {
        text: join_words(words.iter().map(|w| w.text.as_str())),
        words,
        language: language.map(|l| l.code.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::RecognizedToken;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct FakeRecognizer {
        detected: Result<&'static str, ()>,
        forced: Mutex<Vec<Option<String>>>,
    }

    impl FakeRecognizer {
        fn detecting(detected: Result<&'static str, ()>) -> Self {
            Self {
                detected,
                forced: Mutex::new(Vec::new()),
            }
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        async fn transcribe(
            &self,
            _audio: &Path,
            language: Option<&str>,
        ) -> Result<Vec<RecognizedToken>, AsrError> {
            self.forced.lock().unwrap().push(language.map(str::to_string));
            Ok(vec![
                RecognizedToken::new(" Hello", 0.0, 0.4),
                RecognizedToken::new(" there", 0.5, 0.9),
                RecognizedToken::new(".", 0.9, 1.0),
            ])
        }

        async fn detect_language(&self, _audio: &Path, _clip: f64) -> Result<String, AsrError> {
            self.detected
                .map(str::to_string)
                .map_err(|_| AsrError::DetectionFailed("no speech".to_string()))
        }
    }

    fn audio() -> NamedTempFile {
        NamedTempFile::new().unwrap()
    }

    #[test]
    fn test_hint_parsing() {
        assert_eq!("auto".parse::<LanguageHint>().unwrap(), LanguageHint::Auto);
        assert_eq!(
            "zh-tw".parse::<LanguageHint>().unwrap(),
            LanguageHint::Fixed("zh-TW".to_string())
        );
        assert!("klingon".parse::<LanguageHint>().is_err());
    }

    #[tokio::test]
    async fn test_auto_detects_once_then_forces() {
        let audio = audio();
        let recognizer = FakeRecognizer::detecting(Ok("zh-TW"));
        let transcript =
            transcribe_with_hint(&recognizer, audio.path(), &LanguageHint::Auto, &HintConfig::default())
                .await
                .unwrap();

        assert_eq!(transcript.language.as_deref(), Some("zh-TW"));
        assert_eq!(*recognizer.forced.lock().unwrap(), vec![Some("zh".to_string())]);
        assert_eq!(transcript.text, "Hello there.");
        assert_eq!(transcript.words.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_detection_falls_back_to_recognizer_choice() {
        let audio = audio();
        let recognizer = FakeRecognizer::detecting(Err(()));
        let transcript =
            transcribe_with_hint(&recognizer, audio.path(), &LanguageHint::Auto, &HintConfig::default())
                .await
                .unwrap();

        assert_eq!(transcript.language, None);
        assert_eq!(*recognizer.forced.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_fixed_language_skips_detection() {
        let audio = audio();
        let recognizer = FakeRecognizer::detecting(Ok("ja"));
        let hint = LanguageHint::Fixed("en".to_string());
        let transcript = transcribe_with_hint(&recognizer, audio.path(), &hint, &HintConfig::default())
            .await
            .unwrap();
        assert_eq!(transcript.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_missing_audio() {
        let recognizer = FakeRecognizer::detecting(Ok("en"));
        let result = transcribe_with_hint(
            &recognizer,
            Path::new("/nonexistent/a.wav"),
            &LanguageHint::Auto,
            &HintConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(AsrError::FileNotFound(_))));
    }
}
