//! Shared type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Largest magnitude of a fine-tune offset (seconds)
pub const FINE_TUNE_LIMIT: f64 = 0.5;

/// Round seconds to whole milliseconds, the unit all stable keys are built from
pub fn to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Word-level timestamp produced by the recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    /// Recognized text
    #[serde(alias = "word")]
    pub text: String,
    /// Start time (seconds)
    pub start: f64,
    /// End time (seconds)
    pub end: f64,
}

impl WordTiming {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Output of one transcription run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full recognized text
    #[serde(default)]
    pub text: String,
    /// Word timings in recognition order
    pub words: Vec<WordTiming>,
    /// Language the recognizer ran with, if known
    #[serde(default)]
    pub language: Option<String>,
}

impl Transcript {
    /// Decode a transcript from its JSON form
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Stable identifier of a sentence span, derived from its rounded bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentenceId {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl SentenceId {
    pub fn from_times(start: f64, end: f64) -> Self {
        Self {
            start_ms: to_ms(start),
            end_ms: to_ms(end),
        }
    }
}

impl fmt::Display for SentenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.start_ms, self.end_ms)
    }
}

impl FromStr for SentenceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = parse_ms_range(s).ok_or_else(|| CoreError::InvalidKey(s.to_string()))?;
        Ok(Self {
            start_ms: start,
            end_ms: end,
        })
    }
}

/// Which kind of segment a key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Sub-segment of a sentence split at pause markers
    Sub,
    /// Hard-word span selected by hard-word markers
    HardWord,
}

/// Key of a sub-segment or hard-word span inside a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    pub sentence: SentenceId,
    pub kind: SegmentKind,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl SegmentKey {
    pub fn sub(sentence: SentenceId, start: f64, end: f64) -> Self {
        Self {
            sentence,
            kind: SegmentKind::Sub,
            start_ms: to_ms(start),
            end_ms: to_ms(end),
        }
    }

    pub fn hard_word(sentence: SentenceId, start: f64, end: f64) -> Self {
        Self {
            sentence,
            kind: SegmentKind::HardWord,
            start_ms: to_ms(start),
            end_ms: to_ms(end),
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Sub => write!(f, "{}|{}_{}", self.sentence, self.start_ms, self.end_ms),
            SegmentKind::HardWord => {
                write!(f, "{}|hw|{}_{}", self.sentence, self.start_ms, self.end_ms)
            }
        }
    }
}

impl FromStr for SegmentKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidKey(s.to_string());
        let parts: Vec<&str> = s.split('|').collect();
        let (sentence, kind, range) = match parts.as_slice() {
            [sentence, range] => (*sentence, SegmentKind::Sub, *range),
            [sentence, "hw", range] => (*sentence, SegmentKind::HardWord, *range),
            _ => return Err(invalid()),
        };
        let sentence: SentenceId = sentence.parse().map_err(|_| invalid())?;
        let (start_ms, end_ms) = parse_ms_range(range).ok_or_else(invalid)?;
        Ok(Self {
            sentence,
            kind,
            start_ms,
            end_ms,
        })
    }
}

fn parse_ms_range(s: &str) -> Option<(i64, i64)> {
    let (start, end) = s.split_once('_')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

// Keys travel as strings so they can key JSON objects.
macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(SentenceId);
string_serde!(SegmentKey);

/// Sentence-level time span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub id: SentenceId,
    /// Display text joined from the recognized words
    pub text: String,
    /// Start time (seconds)
    pub start: f64,
    /// End time (seconds)
    pub end: f64,
}

impl SentenceSpan {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: SentenceId::from_times(start, end),
            text: text.into(),
            start,
            end,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Part of a sentence between two pause markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSegment {
    pub key: SegmentKey,
    pub index: usize,
    pub base_start: f64,
    pub base_end: f64,
    /// Text slice between the surrounding pause markers
    pub text: String,
}

/// Word or bundle of words singled out for focused repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardWordSpan {
    pub key: SegmentKey,
    pub index: usize,
    pub base_start: f64,
    pub base_end: f64,
    /// Joined text of the selected words
    pub word: String,
}

/// Symmetric start/end nudge applied on top of base times
///
/// Offsets are clamped to `±FINE_TUNE_LIMIT` whenever they are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FineTune {
    #[serde(default)]
    start_offset: f64,
    #[serde(default)]
    end_offset: f64,
}

impl FineTune {
    pub fn new(start_offset: f64, end_offset: f64) -> Self {
        Self {
            start_offset: clamp_offset(start_offset),
            end_offset: clamp_offset(end_offset),
        }
    }

    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    pub fn end_offset(&self) -> f64 {
        self.end_offset
    }

    pub fn is_zero(&self) -> bool {
        self.start_offset == 0.0 && self.end_offset == 0.0
    }

    /// Add deltas to both offsets, clamping the result
    pub fn nudged(&self, start_delta: f64, end_delta: f64) -> Self {
        Self::new(self.start_offset + start_delta, self.end_offset + end_delta)
    }

    /// Re-apply the clamp, e.g. after decoding
    pub fn clamped(&self) -> Self {
        Self::new(self.start_offset, self.end_offset)
    }
}

fn clamp_offset(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-FINE_TUNE_LIMIT, FINE_TUNE_LIMIT)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_id_rounds_to_milliseconds() {
        let a = SentenceId::from_times(1.2344, 2.0004);
        let b = SentenceId::from_times(1.2341, 1.9996);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1234_2000");
    }

    #[test]
    fn test_segment_key_display_and_parse() {
        let sentence = SentenceId::from_times(1.0, 4.0);
        let sub = SegmentKey::sub(sentence, 1.0, 2.5);
        let hw = SegmentKey::hard_word(sentence, 2.5, 3.1);

        assert_eq!(sub.to_string(), "1000_4000|1000_2500");
        assert_eq!(hw.to_string(), "1000_4000|hw|2500_3100");
        assert_eq!("1000_4000|1000_2500".parse::<SegmentKey>().unwrap(), sub);
        assert_eq!("1000_4000|hw|2500_3100".parse::<SegmentKey>().unwrap(), hw);
        assert!("1000_4000|xx|1_2".parse::<SegmentKey>().is_err());
        assert!("garbage".parse::<SentenceId>().is_err());
    }

    #[test]
    fn test_keys_serialize_as_json_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(SentenceId::from_times(0.0, 1.5), 3);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0_1500":3}"#);

        let back: std::collections::BTreeMap<SentenceId, i32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_fine_tune_clamps_on_write() {
        let tune = FineTune::new(2.0, -2.0);
        assert_eq!(tune.start_offset(), 0.5);
        assert_eq!(tune.end_offset(), -0.5);

        let nudged = FineTune::new(0.4, 0.0).nudged(0.3, f64::NAN);
        assert_eq!(nudged.start_offset(), 0.5);
        assert_eq!(nudged.end_offset(), 0.0);
    }

    #[test]
    fn test_word_timing_accepts_word_alias() {
        let word: WordTiming =
            serde_json::from_str(r#"{"word":"hola","start":0.5,"end":0.9}"#).unwrap();
        assert_eq!(word.text, "hola");
        assert!((word.duration() - 0.4).abs() < 1e-9);
    }
}
