//! Per-invocation lesson state

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use echodrill_asr::{merge_tokens_into_words, RecognizedToken};
use echodrill_core::segmenter::join_words;
use echodrill_core::{
    CutPlan, PracticeSession, SegmenterConfig, SentenceId, SentenceSegmenter, SentenceSpan,
    Transcript, WordTiming,
};
use echodrill_playback::probe_duration;
use echodrill_store::PlanStore;
use tracing::{debug, warn};

/// Arguments naming one audio item and its transcript
#[derive(Args, Debug, Clone)]
pub struct LessonArgs {
    /// Audio file the transcript belongs to.
    pub audio: PathBuf,

    /// Word-timed transcript (JSON object or word array).
    #[arg(long)]
    pub words: PathBuf,

    /// The transcript file holds raw recognizer tokens.
    #[arg(long)]
    pub tokens: bool,

    /// Also end sentences at semicolons.
    #[arg(long)]
    pub semicolons: bool,
}

pub fn open_store(dir: Option<PathBuf>) -> Result<PlanStore> {
    match dir {
        Some(dir) => Ok(PlanStore::with_dir(dir)),
        None => PlanStore::new().context("Failed to locate the plan directory"),
    }
}

/// Read a transcript in any of the accepted shapes
pub fn read_transcript(path: &Path, tokens: bool) -> Result<Transcript> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;

    if tokens {
        let tokens: Vec<RecognizedToken> = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a token list", path.display()))?;
        let words = merge_tokens_into_words(&tokens);
        return Ok(Transcript {
            text: join_words(words.iter().map(|w| w.text.as_str())),
            words,
            language: None,
        });
    }

    if let Ok(transcript) = Transcript::from_json_str(&json) {
        return Ok(transcript);
    }
    let words: Vec<WordTiming> = serde_json::from_str(&json)
        .with_context(|| format!("{} is neither a transcript nor a word list", path.display()))?;
    Ok(Transcript {
        text: join_words(words.iter().map(|w| w.text.as_str())),
        words,
        language: None,
    })
}

/// Transcript, sentences and saved plan of one audio item
pub struct Lesson {
    pub audio: PathBuf,
    pub item_id: String,
    pub transcript: Transcript,
    pub sentences: Vec<SentenceSpan>,
    pub plan: CutPlan,
}

impl Lesson {
    pub async fn open(store: &PlanStore, args: &LessonArgs) -> Result<Self> {
        let transcript = read_transcript(&args.words, args.tokens)?;
        let segmenter = SentenceSegmenter::new(SegmenterConfig {
            break_on_semicolon: args.semicolons,
            ..SegmenterConfig::default()
        });
        let sentences = segmenter.segment(&transcript.words);
        debug!(
            "{} words segmented into {} sentences",
            transcript.words.len(),
            sentences.len()
        );

        let item_id = std::fs::canonicalize(&args.audio)
            .unwrap_or_else(|_| args.audio.clone())
            .display()
            .to_string();
        let mut plan = store
            .load_or_default(&item_id)
            .await
            .with_context(|| format!("Failed to load the plan for {}", item_id))?;
        if plan.language.is_none() {
            plan.language = transcript.language.clone();
        }

        Ok(Self {
            audio: args.audio.clone(),
            item_id,
            transcript,
            sentences,
            plan,
        })
    }

    /// Find a sentence by 1-based index or by id (`<startMs>_<endMs>`)
    pub fn sentence(&self, selector: &str) -> Result<&SentenceSpan> {
        if let Ok(index) = selector.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| self.sentences.get(i))
                .ok_or_else(|| anyhow!("No sentence {} (there are {})", index, self.sentences.len()));
        }
        let id: SentenceId = selector
            .parse()
            .map_err(|e| anyhow!("Bad sentence selector {:?}: {}", selector, e))?;
        match self.sentences.iter().find(|s| s.id == id) {
            Some(sentence) => Ok(sentence),
            None => bail!("No sentence with id {}", id),
        }
    }

    /// Audio length, from the file when it can be probed
    pub fn audio_duration(&self) -> f64 {
        match probe_duration(&self.audio) {
            Ok(duration) => duration,
            Err(e) => {
                let fallback = self
                    .transcript
                    .words
                    .iter()
                    .map(|w| w.end)
                    .fold(0.0, f64::max);
                warn!("Could not probe {}: {}, using {:.2}s", self.audio.display(), e, fallback);
                fallback
            }
        }
    }

    pub fn session(&self) -> PracticeSession<'_> {
        PracticeSession::new(&self.sentences, &self.transcript.words, &self.plan)
            .with_audio_duration(self.audio_duration())
    }

    pub async fn save(&mut self, store: &PlanStore) -> Result<PathBuf> {
        self.plan.touch();
        store
            .save(&self.item_id, &self.plan)
            .await
            .with_context(|| format!("Failed to save the plan for {}", self.item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_transcript_shapes() {
        let dir = TempDir::new().unwrap();

        let object = dir.path().join("object.json");
        std::fs::write(
            &object,
            r#"{"text": "Hi there.", "words": [{"word": "Hi", "start": 0.0, "end": 0.3},
                {"word": "there.", "start": 0.4, "end": 0.9}], "language": "en"}"#,
        )
        .unwrap();
        let transcript = read_transcript(&object, false).unwrap();
        assert_eq!(transcript.words.len(), 2);
        assert_eq!(transcript.language.as_deref(), Some("en"));

        let array = dir.path().join("array.json");
        std::fs::write(&array, r#"[{"text": "Hi", "start": 0.0, "end": 0.3}]"#).unwrap();
        assert_eq!(read_transcript(&array, false).unwrap().text, "Hi");

        let tokens = dir.path().join("tokens.json");
        std::fs::write(
            &tokens,
            r#"[{"text": " Hel", "start": 0.0, "end": 0.2}, {"text": "lo", "start": 0.2, "end": 0.4}]"#,
        )
        .unwrap();
        let transcript = read_transcript(&tokens, true).unwrap();
        assert_eq!(transcript.words[0].text, "Hello");
    }

    #[tokio::test]
    async fn test_sentence_selectors() {
        let dir = TempDir::new().unwrap();
        let words = dir.path().join("words.json");
        std::fs::write(
            &words,
            r#"[{"text": "Hi.", "start": 0.0, "end": 0.5}, {"text": "Bye.", "start": 1.0, "end": 1.5}]"#,
        )
        .unwrap();
        let store = PlanStore::with_dir(dir.path().join("plans"));
        let args = LessonArgs {
            audio: dir.path().join("missing.wav"),
            words,
            tokens: false,
            semicolons: false,
        };

        let lesson = Lesson::open(&store, &args).await.unwrap();
        assert_eq!(lesson.sentence("2").unwrap().text, "Bye.");
        assert_eq!(lesson.sentence("0_500").unwrap().text, "Hi.");
        assert!(lesson.sentence("0").is_err());
        assert!(lesson.sentence("3").is_err());
        assert_eq!(lesson.audio_duration(), 1.5);
    }
}
