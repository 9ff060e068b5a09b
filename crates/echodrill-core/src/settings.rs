//! User-facing playback settings

use serde::{Deserialize, Serialize};

use crate::timing::PracticeMode;

pub const REPEAT_RANGE: (u8, u8) = (1, 5);
pub const SILENCE_MULTIPLIER_RANGE: (f64, f64) = (0.2, 15.0);
pub const WORD_LOOPS_RANGE: (u8, u8) = (1, 5);
pub const TEXT_SCALE_RANGE: (f64, f64) = (0.8, 2.0);

/// Playback knobs persisted with each cut plan
///
/// Every setter clamps; decoded records go through [`PlaybackSettings::sanitize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Repetitions per segment in repeat practice
    pub repeat_count: u8,
    /// Silence after each repetition, as a multiple of the segment length
    pub silence_multiplier: f64,
    /// Repetitions per word in word shadowing
    pub word_repeat_count: u8,
    /// Silence after each word repetition, as a multiple of the word length
    pub word_silence_multiplier: f64,
    /// How many times the whole word list is walked
    pub word_loops: u8,
    /// Display scale of the transcript text
    pub text_scale: f64,
    /// Only practice flagged sentences
    pub flagged_only: bool,
    /// Ignore pause markers and practice whole sentences
    pub sentence_only: bool,
    /// Practice hard words instead of sentences
    pub word_shadowing: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repeat_count: 2,
            silence_multiplier: 1.0,
            word_repeat_count: 2,
            word_silence_multiplier: 1.5,
            word_loops: 1,
            text_scale: 1.0,
            flagged_only: false,
            sentence_only: false,
            word_shadowing: false,
        }
    }
}

impl PlaybackSettings {
    pub fn set_repeat_count(&mut self, value: u8) {
        self.repeat_count = clamp_count(value, REPEAT_RANGE);
    }

    pub fn set_silence_multiplier(&mut self, value: f64) {
        self.silence_multiplier = clamp_multiplier(value, 1.0);
    }

    pub fn set_word_repeat_count(&mut self, value: u8) {
        self.word_repeat_count = clamp_count(value, REPEAT_RANGE);
    }

    pub fn set_word_silence_multiplier(&mut self, value: f64) {
        self.word_silence_multiplier = clamp_multiplier(value, 1.5);
    }

    pub fn set_word_loops(&mut self, value: u8) {
        self.word_loops = clamp_count(value, WORD_LOOPS_RANGE);
    }

    pub fn set_text_scale(&mut self, value: f64) {
        self.text_scale = if value.is_finite() {
            value.clamp(TEXT_SCALE_RANGE.0, TEXT_SCALE_RANGE.1)
        } else {
            1.0
        };
    }

    /// Re-clamp every field, used after decoding a stored record
    pub fn sanitize(&mut self) {
        self.set_repeat_count(self.repeat_count);
        self.set_silence_multiplier(self.silence_multiplier);
        self.set_word_repeat_count(self.word_repeat_count);
        self.set_word_silence_multiplier(self.word_silence_multiplier);
        self.set_word_loops(self.word_loops);
        self.set_text_scale(self.text_scale);
    }

    /// Practice mode these settings select
    pub fn practice_mode(&self) -> PracticeMode {
        if self.word_shadowing {
            PracticeMode::word_shadowing(
                self.word_repeat_count,
                self.word_silence_multiplier,
                self.word_loops,
            )
        } else {
            PracticeMode::repeat_practice(
                self.repeat_count,
                self.silence_multiplier,
                self.sentence_only,
            )
        }
    }
}

pub(crate) fn clamp_count(value: u8, range: (u8, u8)) -> u8 {
    value.clamp(range.0, range.1)
}

pub(crate) fn clamp_multiplier(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(SILENCE_MULTIPLIER_RANGE.0, SILENCE_MULTIPLIER_RANGE.1)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp() {
        let mut settings = PlaybackSettings::default();
        settings.set_repeat_count(9);
        settings.set_silence_multiplier(0.01);
        settings.set_word_loops(0);
        settings.set_text_scale(10.0);

        assert_eq!(settings.repeat_count, 5);
        assert_eq!(settings.silence_multiplier, 0.2);
        assert_eq!(settings.word_loops, 1);
        assert_eq!(settings.text_scale, 2.0);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings: PlaybackSettings =
            serde_json::from_str(r#"{"repeat_count":3,"sentence_only":true}"#).unwrap();
        assert_eq!(settings.repeat_count, 3);
        assert!(settings.sentence_only);
        assert_eq!(settings.word_silence_multiplier, 1.5);
        assert_eq!(settings.word_loops, 1);
    }

    #[test]
    fn test_sanitize_reclamps_decoded_values() {
        let mut settings: PlaybackSettings =
            serde_json::from_str(r#"{"repeat_count":40,"silence_multiplier":99.0}"#).unwrap();
        settings.sanitize();
        assert_eq!(settings.repeat_count, 5);
        assert_eq!(settings.silence_multiplier, 15.0);
    }

    #[test]
    fn test_practice_mode_follows_flags() {
        let mut settings = PlaybackSettings::default();
        assert!(matches!(
            settings.practice_mode(),
            PracticeMode::RepeatPractice { repeats: 2, .. }
        ));

        settings.word_shadowing = true;
        assert!(matches!(
            settings.practice_mode(),
            PracticeMode::WordShadowing { outer_loops: 1, .. }
        ));
    }
}
