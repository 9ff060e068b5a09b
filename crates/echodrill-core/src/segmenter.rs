//! Sentence segmentation from word timestamps

use tracing::debug;

use crate::types::{SentenceSpan, WordTiming};

/// Spans shorter than this (seconds) are dropped
pub const MIN_SENTENCE_SECONDS: f64 = 0.03;

const SENTENCE_TERMINATORS: &[char] = &['.', '?', '!', '…', '。', '？', '！'];
const CLAUSE_TERMINATORS: &[char] = &[';', '；'];
const TRAILING_CLOSERS: &[char] = &['"', '\'', '”', '’', '»', ')', ']', '」', '』'];
const NO_SPACE_BEFORE: &[char] = &[
    ')', ']', '}', ',', '.', '?', '!', '…', ';', ':', '”', '’', '»', '」', '』', '、', '，', '。',
    '？', '！', '：', '；',
];

/// Segmenter settings
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Treat `;` as the end of a sentence
    pub break_on_semicolon: bool,
    /// Minimum span length (seconds)
    pub min_span_seconds: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            break_on_semicolon: false,
            min_span_seconds: MIN_SENTENCE_SECONDS,
        }
    }
}

/// Groups words into sentence-level spans at end punctuation
pub struct SentenceSegmenter {
    config: SegmenterConfig,
}

impl SentenceSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Build sentence spans from word timings
    ///
    /// Words are ordered by start time first. A span runs from its first
    /// word's start to the largest end inside it, trimmed so it never
    /// overlaps the next span.
    pub fn segment(&self, words: &[WordTiming]) -> Vec<SentenceSpan> {
        let mut ordered: Vec<&WordTiming> = words
            .iter()
            .filter(|w| !w.text.trim().is_empty())
            .collect();
        ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut raw: Vec<(String, f64, f64)> = Vec::new();
        let mut buffer: Vec<&WordTiming> = Vec::new();

        for word in ordered {
            buffer.push(word);
            if self.ends_sentence(&word.text) {
                raw.push(flush(&buffer));
                buffer.clear();
            }
        }
        if !buffer.is_empty() {
            raw.push(flush(&buffer));
        }

        for i in 1..raw.len() {
            let next_start = raw[i].1;
            let prev = &mut raw[i - 1];
            if prev.2 > next_start {
                prev.2 = next_start;
            }
        }

        let spans: Vec<SentenceSpan> = raw
            .into_iter()
            .filter(|(_, start, end)| end - start >= self.config.min_span_seconds)
            .map(|(text, start, end)| SentenceSpan::new(text, start, end))
            .collect();

        debug!("Segmented {} words into {} sentences", words.len(), spans.len());
        spans
    }

    fn ends_sentence(&self, text: &str) -> bool {
        let trimmed = text.trim_end().trim_end_matches(TRAILING_CLOSERS);
        match trimmed.chars().last() {
            Some(c) if SENTENCE_TERMINATORS.contains(&c) => true,
            Some(c) if self.config.break_on_semicolon => CLAUSE_TERMINATORS.contains(&c),
            _ => false,
        }
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

fn flush(buffer: &[&WordTiming]) -> (String, f64, f64) {
    let start = buffer.first().map(|w| w.start).unwrap_or(0.0);
    let end = buffer.iter().map(|w| w.end).fold(start, f64::max);
    (join_words(buffer.iter().map(|w| w.text.as_str())), start, end)
}

/// Join words into display text, without a space before closing punctuation
pub fn join_words<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut text = String::new();
    for word in words {
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        let attach = word
            .chars()
            .next()
            .is_some_and(|c| NO_SPACE_BEFORE.contains(&c));
        if !text.is_empty() && !attach {
            text.push(' ');
        }
        text.push_str(word);
    }
    text
}
