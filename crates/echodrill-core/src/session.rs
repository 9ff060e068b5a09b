//! Practice assembly from sentences, words and a cut plan

use tracing::debug;

use crate::cut_plan::CutPlan;
use crate::markers::WORD_WINDOW_EPSILON;
use crate::plan::{SegmentPlanBuilder, TimedSegment};
use crate::timing::{
    build_schedule, estimate_duration, PracticeInput, PracticeMode, PracticeSentence, Schedule,
    TimingProfile,
};
use crate::types::{SegmentKey, SentenceSpan, WordTiming};

/// Resolves one audio item's annotations into practice input
pub struct PracticeSession<'a> {
    sentences: &'a [SentenceSpan],
    words: &'a [WordTiming],
    plan: &'a CutPlan,
    builder: SegmentPlanBuilder,
    audio_duration: Option<f64>,
}

impl<'a> PracticeSession<'a> {
    pub fn new(sentences: &'a [SentenceSpan], words: &'a [WordTiming], plan: &'a CutPlan) -> Self {
        Self {
            sentences,
            words,
            plan,
            builder: SegmentPlanBuilder::default(),
            audio_duration: None,
        }
    }

    /// Cap padded windows at the audio length
    pub fn with_audio_duration(mut self, duration: f64) -> Self {
        self.audio_duration = Some(duration);
        self
    }

    /// Sentences taking part, honoring the flagged-only setting
    pub fn selected_sentences(&self) -> Vec<&'a SentenceSpan> {
        let plan = self.plan;
        self.sentences
            .iter()
            .filter(|s| !plan.settings.flagged_only || plan.is_flagged(&s.id))
            .collect()
    }

    /// Mode selected by the plan's settings
    pub fn mode(&self) -> PracticeMode {
        self.plan.settings.practice_mode()
    }

    /// Build the segments every practice mode draws from
    pub fn input(&self) -> PracticeInput {
        let selected = self.selected_sentences();

        let sentences = selected
            .iter()
            .map(|sentence| {
                let subs = self.plan.sub_segments(sentence);
                PracticeSentence {
                    whole: self
                        .builder
                        .resolve_whole_sentence(sentence, &subs, &self.plan.sub_tunes),
                    parts: self
                        .builder
                        .resolve_sub_segments(sentence, &subs, &self.plan.sub_tunes),
                }
            })
            .collect();

        let mut words: Vec<TimedSegment> = selected
            .iter()
            .flat_map(|sentence| {
                self.plan
                    .hard_word_spans(sentence, self.words)
                    .into_iter()
                    .map(move |span| {
                        let tune = self.plan.tune_for(&span.key);
                        self.builder.resolve_hard_word(sentence, &span, tune)
                    })
            })
            .collect();

        if words.is_empty() {
            debug!("No hard words marked, shadowing every word of the selection");
            words = selected
                .iter()
                .flat_map(|sentence| self.sentence_words(sentence))
                .collect();
        }

        PracticeInput {
            sentences,
            words,
            audio_duration: self.audio_duration,
        }
    }

    /// Schedule of a mode over this session
    pub fn schedule(&self, mode: PracticeMode, profile: &TimingProfile) -> Schedule {
        build_schedule(mode, &self.input(), profile)
    }

    /// Predicted run length of a mode (seconds)
    pub fn estimate(&self, mode: PracticeMode, profile: &TimingProfile) -> f64 {
        estimate_duration(&self.schedule(mode, profile))
    }

    fn sentence_words(&self, sentence: &SentenceSpan) -> Vec<TimedSegment> {
        self.words
            .iter()
            .filter(|w| {
                w.start >= sentence.start - WORD_WINDOW_EPSILON
                    && w.end <= sentence.end + WORD_WINDOW_EPSILON
                    && !w.text.trim().is_empty()
            })
            .map(|w| TimedSegment {
                key: SegmentKey::hard_word(sentence.id, w.start, w.end),
                sentence: sentence.id,
                start: w.start,
                end: w.end,
                text: w.text.trim().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::SentenceSegmenter;

    fn transcript() -> Vec<WordTiming> {
        vec![
            WordTiming::new("Good", 1.0, 1.4),
            WordTiming::new("morning", 1.5, 2.4),
            WordTiming::new("everyone.", 2.6, 4.0),
            WordTiming::new("Sit", 5.0, 5.3),
            WordTiming::new("down.", 5.4, 6.0),
        ]
    }

    #[test]
    fn test_estimate_for_one_cut_sentence() {
        let words = transcript();
        let sentences = SentenceSegmenter::default().segment(&words);
        let mut plan = CutPlan::new();
        plan.apply_sentence_edit(&sentences[0], "Good morning\u{23F8} everyone.", &words);
        plan.toggle_flag(sentences[0].id);
        plan.settings.flagged_only = true;

        let session = PracticeSession::new(&sentences, &words, &plan);
        assert_eq!(session.selected_sentences().len(), 1);

        let mode = PracticeMode::repeat_practice(2, 1.0, false);
        let estimate = session.estimate(mode, &TimingProfile::default());

        // (1.0, 2.4) and (2.4, 4.0), each padded by 0.14
        let first = 2.0 * (1.4 + 0.14 + 1.4);
        let second = 2.0 * (1.6 + 0.14 + 1.6);
        assert!((estimate - (first + 0.12 + second)).abs() < 1e-9);
    }

    #[test]
    fn test_word_shadowing_prefers_marked_hard_words() {
        let words = transcript();
        let sentences = SentenceSegmenter::default().segment(&words);
        let mut plan = CutPlan::new();

        let session = PracticeSession::new(&sentences, &words, &plan);
        assert_eq!(session.input().words.len(), 5);

        plan.apply_sentence_edit(&sentences[1], "\u{2605}\u{2605}Sit down.", &words);
        let key = plan.hard_word_spans(&sentences[1], &words)[0].key;
        plan.set_tune(key, crate::types::FineTune::new(-0.1, 0.0));

        let session = PracticeSession::new(&sentences, &words, &plan);
        let input = session.input();
        assert_eq!(input.words.len(), 1);
        assert_eq!(input.words[0].text, "Sit down.");
        assert!((input.words[0].start - 4.9).abs() < 1e-9);
    }

    #[test]
    fn test_audio_duration_flows_into_input() {
        let words = transcript();
        let sentences = SentenceSegmenter::default().segment(&words);
        let plan = CutPlan::new();
        let session = PracticeSession::new(&sentences, &words, &plan).with_audio_duration(6.05);
        assert_eq!(session.input().audio_duration, Some(6.05));
        assert!(matches!(session.mode(), PracticeMode::RepeatPractice { .. }));
    }
}
