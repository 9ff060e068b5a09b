//! Practice timing formula
//!
//! [`build_schedule`] expands a practice mode into an ordered list of steps.
//! The playback scheduler executes those steps; [`estimate_duration`] only
//! sums them. Both read the same [`TimingProfile`], so a preview always
//! matches what a run will do.

use serde::{Deserialize, Serialize};

use crate::plan::TimedSegment;
use crate::settings::{clamp_count, clamp_multiplier, REPEAT_RANGE, WORD_LOOPS_RANGE};
use crate::types::SegmentKey;

/// Padding, floors and gaps used when turning segments into playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Lead-in before a sentence-level segment (seconds)
    pub sentence_head_pad: f64,
    /// Tail after a sentence-level segment (seconds)
    pub sentence_tail_pad: f64,
    /// Tail multiplier for whole-sentence segments
    pub whole_sentence_tail_factor: f64,
    /// Lead-in before a word segment (seconds)
    pub word_head_pad: f64,
    /// Tail after a word segment (seconds)
    pub word_tail_pad: f64,
    /// Sentence-level windows shorter than this are skipped (seconds)
    pub sentence_min_play: f64,
    /// Word windows shorter than this are skipped (seconds)
    pub word_min_play: f64,
    /// Silence after the cue between segments (seconds)
    pub cue_gap: f64,
    /// Lower bound of the silence after a sentence-level repetition (seconds)
    pub sentence_min_silence: f64,
    /// Word length floor used for the silence after a word repetition (seconds)
    pub word_min_length: f64,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            sentence_head_pad: 0.02,
            sentence_tail_pad: 0.12,
            whole_sentence_tail_factor: 2.0,
            word_head_pad: 0.0,
            word_tail_pad: 0.0,
            sentence_min_play: 0.03,
            word_min_play: 0.02,
            cue_gap: 0.12,
            sentence_min_silence: 0.05,
            word_min_length: 0.03,
        }
    }
}

/// How a segment is played back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentGrain {
    /// Sub-segment of a sentence
    Sentence,
    /// A sentence played as a single segment
    WholeSentence,
    /// Word or word bundle, played without padding
    Word,
}

/// Practice scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PracticeMode {
    /// Every segment once, with a cue between segments
    CuedSequence,
    /// Each segment repeated with proportional silence
    RepeatPractice {
        repeats: u8,
        silence_multiplier: f64,
        sentence_only: bool,
    },
    /// Word segments repeated with proportional silence, list looped
    WordShadowing {
        repeats: u8,
        silence_multiplier: f64,
        outer_loops: u8,
    },
}

impl PracticeMode {
    pub fn repeat_practice(repeats: u8, silence_multiplier: f64, sentence_only: bool) -> Self {
        PracticeMode::RepeatPractice {
            repeats: clamp_count(repeats, REPEAT_RANGE),
            silence_multiplier: clamp_multiplier(silence_multiplier, 1.0),
            sentence_only,
        }
    }

    pub fn word_shadowing(repeats: u8, silence_multiplier: f64, outer_loops: u8) -> Self {
        PracticeMode::WordShadowing {
            repeats: clamp_count(repeats, REPEAT_RANGE),
            silence_multiplier: clamp_multiplier(silence_multiplier, 1.5),
            outer_loops: clamp_count(outer_loops, WORD_LOOPS_RANGE),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PracticeMode::CuedSequence => "cued_sequence",
            PracticeMode::RepeatPractice { .. } => "repeat_practice",
            PracticeMode::WordShadowing { .. } => "word_shadowing",
        }
    }
}

/// One sentence prepared for practice
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSentence {
    /// The sentence as a single segment
    pub whole: TimedSegment,
    /// Its sub-segments, in order
    pub parts: Vec<TimedSegment>,
}

/// Everything a schedule is built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeInput {
    pub sentences: Vec<PracticeSentence>,
    /// Word-level segments for shadowing
    pub words: Vec<TimedSegment>,
    /// Length of the audio, used to cap padded windows
    pub audio_duration: Option<f64>,
}

/// Absolute window handed to the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayWindow {
    pub key: SegmentKey,
    pub start: f64,
    pub end: f64,
    pub grain: SegmentGrain,
    pub text: String,
}

impl PlayWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One unit of a practice run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Play a window of the audio
    Play(PlayWindow),
    /// Silence for the learner to repeat (seconds)
    Silence { seconds: f64 },
    /// Audible cue marking a segment boundary
    Cue,
    /// Short silence after a cue (seconds)
    Gap { seconds: f64 },
    /// A segment visit finished
    Progress { done: usize, total: usize },
}

impl Step {
    /// Wall-clock time the step occupies
    pub fn duration(&self) -> f64 {
        match self {
            Step::Play(window) => window.duration(),
            Step::Silence { seconds } | Step::Gap { seconds } => *seconds,
            Step::Cue | Step::Progress { .. } => 0.0,
        }
    }
}

/// Ordered steps of one practice run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub mode: Option<PracticeMode>,
    pub steps: Vec<Step>,
    /// Number of segment visits the run makes
    pub total_segments: usize,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.total_segments == 0
    }

    /// Number of play steps actually issued
    pub fn play_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Play(_))).count()
    }
}

/// Expand a practice mode into steps
pub fn build_schedule(
    mode: PracticeMode,
    input: &PracticeInput,
    profile: &TimingProfile,
) -> Schedule {
    let mut builder = StepBuilder {
        profile,
        audio_duration: input.audio_duration,
        steps: Vec::new(),
    };

    let total_segments = match mode {
        PracticeMode::CuedSequence => {
            let segments: Vec<&TimedSegment> =
                input.sentences.iter().flat_map(|s| s.parts.iter()).collect();
            let total = segments.len();
            for (i, segment) in segments.iter().enumerate() {
                builder.play(segment, SegmentGrain::Sentence);
                builder.boundary(i + 1, total, false);
            }
            total
        }
        PracticeMode::RepeatPractice {
            repeats,
            silence_multiplier,
            sentence_only,
        } => {
            let segments: Vec<(&TimedSegment, SegmentGrain)> = if sentence_only {
                input
                    .sentences
                    .iter()
                    .map(|s| (&s.whole, SegmentGrain::WholeSentence))
                    .collect()
            } else {
                input
                    .sentences
                    .iter()
                    .flat_map(|s| s.parts.iter().map(|p| (p, SegmentGrain::Sentence)))
                    .collect()
            };
            let total = segments.len();
            for (i, (segment, grain)) in segments.iter().enumerate() {
                let silence =
                    (segment.duration() * silence_multiplier).max(profile.sentence_min_silence);
                for _ in 0..repeats {
                    builder.play(segment, *grain);
                    builder.silence(silence);
                }
                builder.boundary(i + 1, total, false);
            }
            total
        }
        PracticeMode::WordShadowing {
            repeats,
            silence_multiplier,
            outer_loops,
        } => {
            let mut words: Vec<&TimedSegment> = input.words.iter().collect();
            words.sort_by(|a, b| a.start.total_cmp(&b.start));
            let total = words.len() * outer_loops as usize;
            let mut done = 0;
            for _ in 0..outer_loops {
                for word in &words {
                    let silence =
                        word.duration().max(profile.word_min_length) * silence_multiplier;
                    for _ in 0..repeats {
                        builder.play(word, SegmentGrain::Word);
                        builder.silence(silence);
                    }
                    done += 1;
                    builder.boundary(done, total, true);
                }
            }
            total
        }
    };

    Schedule {
        mode: Some(mode),
        steps: builder.steps,
        total_segments,
    }
}

/// Predicted wall-clock length of a schedule (seconds)
pub fn estimate_duration(schedule: &Schedule) -> f64 {
    schedule.steps.iter().map(Step::duration).sum()
}

struct StepBuilder<'a> {
    profile: &'a TimingProfile,
    audio_duration: Option<f64>,
    steps: Vec<Step>,
}

impl StepBuilder<'_> {
    fn play(&mut self, segment: &TimedSegment, grain: SegmentGrain) {
        let p = self.profile;
        let (head, tail, floor) = match grain {
            SegmentGrain::Sentence => (p.sentence_head_pad, p.sentence_tail_pad, p.sentence_min_play),
            SegmentGrain::WholeSentence => (
                p.sentence_head_pad,
                p.sentence_tail_pad * p.whole_sentence_tail_factor,
                p.sentence_min_play,
            ),
            SegmentGrain::Word => (p.word_head_pad, p.word_tail_pad, p.word_min_play),
        };

        let start = (segment.start - head).max(0.0);
        let mut end = segment.end + tail;
        if let Some(duration) = self.audio_duration {
            end = end.min(duration);
        }
        if end - start < floor {
            tracing::debug!("Skipping segment {} shorter than {:.3}s", segment.key, floor);
            return;
        }

        self.steps.push(Step::Play(PlayWindow {
            key: segment.key,
            start,
            end,
            grain,
            text: segment.text.clone(),
        }));
    }

    fn silence(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.steps.push(Step::Silence { seconds });
        }
    }

    /// Progress, then a cue and gap
    ///
    /// Sentence modes drop the cue after the last visit; word shadowing cues
    /// every word.
    fn boundary(&mut self, done: usize, total: usize, cue_last: bool) {
        self.steps.push(Step::Progress { done, total });
        if cue_last || done < total {
            self.steps.push(Step::Cue);
            self.steps.push(Step::Gap {
                seconds: self.profile.cue_gap,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SentenceId, SentenceSpan};

    fn seg(sentence: &SentenceSpan, start: f64, end: f64) -> TimedSegment {
        TimedSegment {
            key: SegmentKey::sub(sentence.id, start, end),
            sentence: sentence.id,
            start,
            end,
            text: String::new(),
        }
    }

    fn one_cut_input() -> PracticeInput {
        let sentence = SentenceSpan::new("a b", 1.0, 4.0);
        PracticeInput {
            sentences: vec![PracticeSentence {
                whole: seg(&sentence, 1.0, 4.0),
                parts: vec![seg(&sentence, 1.0, 2.5), seg(&sentence, 2.5, 4.0)],
            }],
            words: Vec::new(),
            audio_duration: None,
        }
    }

    fn word(start: f64, end: f64) -> TimedSegment {
        let sentence = SentenceId::from_times(0.0, 10.0);
        TimedSegment {
            key: SegmentKey::hard_word(sentence, start, end),
            sentence,
            start,
            end,
            text: "w".to_string(),
        }
    }

    #[test]
    fn test_repeat_practice_estimate_matches_hand_computation() {
        let profile = TimingProfile::default();
        let mode = PracticeMode::repeat_practice(2, 1.0, false);
        let schedule = build_schedule(mode, &one_cut_input(), &profile);

        // padded play: 1.5 + 0.02 + 0.12, silence: 1.5 x 1.0
        let per_segment = 2.0 * (1.64 + 1.5);
        let expected = per_segment + 0.12 + per_segment;

        assert_eq!(schedule.total_segments, 2);
        assert_eq!(schedule.play_count(), 4);
        assert!((estimate_duration(&schedule) - expected).abs() < 1e-9);
        assert!(matches!(schedule.steps.last(), Some(Step::Progress { done: 2, total: 2 })));
    }

    #[test]
    fn test_whole_sentence_doubles_tail_pad() {
        let profile = TimingProfile::default();
        let mode = PracticeMode::repeat_practice(1, 1.0, true);
        let schedule = build_schedule(mode, &one_cut_input(), &profile);

        let Some(Step::Play(window)) = schedule.steps.first() else {
            panic!("expected a play step");
        };
        assert!((window.start - 0.98).abs() < 1e-9);
        assert!((window.end - 4.24).abs() < 1e-9);
        assert!((estimate_duration(&schedule) - (3.26 + 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cued_sequence_gaps_between_segments_only() {
        let profile = TimingProfile::default();
        let schedule = build_schedule(PracticeMode::CuedSequence, &one_cut_input(), &profile);

        let cues = schedule.steps.iter().filter(|s| matches!(s, Step::Cue)).count();
        assert_eq!(cues, 1);
        assert!((estimate_duration(&schedule) - (1.64 + 0.12 + 1.64)).abs() < 1e-9);
    }

    #[test]
    fn test_word_shadowing_loops_and_cues_every_word() {
        let profile = TimingProfile::default();
        let input = PracticeInput {
            words: vec![word(2.0, 2.5), word(1.0, 1.01)],
            ..Default::default()
        };
        let mode = PracticeMode::word_shadowing(2, 2.0, 2);
        let schedule = build_schedule(mode, &input, &profile);

        assert_eq!(schedule.total_segments, 4);
        // the 10 ms word is below the 20 ms floor and never plays
        assert_eq!(schedule.play_count(), 4);
        let cues = schedule.steps.iter().filter(|s| matches!(s, Step::Cue)).count();
        assert_eq!(cues, 4);

        let short = 2.0 * (0.03 * 2.0);
        let long = 2.0 * (0.5 + 0.5 * 2.0);
        let expected = 2.0 * (short + long) + 4.0 * 0.12;
        assert!((estimate_duration(&schedule) - expected).abs() < 1e-9);

        // the skipped word still leaves its silence ahead of the first play
        assert!(matches!(schedule.steps.first(), Some(Step::Silence { .. })));
        let first = schedule.steps.iter().find_map(|s| match s {
            Step::Play(w) => Some(w),
            _ => None,
        });
        assert_eq!(first.map(|w| w.start), Some(2.0));
    }

    #[test]
    fn test_single_word_ends_with_cue_and_gap() {
        let profile = TimingProfile::default();
        let input = PracticeInput {
            words: vec![word(1.0, 1.5)],
            ..Default::default()
        };
        let schedule = build_schedule(PracticeMode::word_shadowing(1, 1.0, 1), &input, &profile);

        assert!(matches!(schedule.steps.last(), Some(Step::Gap { .. })));
        let cues = schedule.steps.iter().filter(|s| matches!(s, Step::Cue)).count();
        assert_eq!(cues, 1);
        // play 0.5, silence 0.5, gap 0.12
        assert!((estimate_duration(&schedule) - 1.12).abs() < 1e-9);
    }

    #[test]
    fn test_windows_are_capped_at_audio_length() {
        let profile = TimingProfile::default();
        let mut input = one_cut_input();
        input.audio_duration = Some(4.05);
        let schedule = build_schedule(PracticeMode::CuedSequence, &input, &profile);

        let last_play = schedule.steps.iter().rev().find_map(|s| match s {
            Step::Play(w) => Some(w),
            _ => None,
        });
        assert_eq!(last_play.map(|w| w.end), Some(4.05));
    }

    #[test]
    fn test_mode_constructors_clamp() {
        assert_eq!(
            PracticeMode::repeat_practice(0, 40.0, false),
            PracticeMode::RepeatPractice {
                repeats: 1,
                silence_multiplier: 15.0,
                sentence_only: false
            }
        );
        assert_eq!(
            PracticeMode::word_shadowing(9, 0.0, 9),
            PracticeMode::WordShadowing {
                repeats: 5,
                silence_multiplier: 0.2,
                outer_loops: 5
            }
        );
    }

    #[test]
    fn test_empty_input_yields_empty_schedule() {
        let schedule = build_schedule(
            PracticeMode::CuedSequence,
            &PracticeInput::default(),
            &TimingProfile::default(),
        );
        assert!(schedule.is_empty());
        assert_eq!(estimate_duration(&schedule), 0.0);
    }
}
