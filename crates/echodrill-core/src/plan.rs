//! Sub-segment planning and fine-tune merging

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::markers::split_on_pause;
use crate::segmenter::join_words;
use crate::types::{FineTune, HardWordSpan, SegmentKey, SentenceId, SentenceSpan, SubSegment};

/// Plan builder settings
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Cuts closer than this to a sentence edge or to each other are ignored (seconds)
    pub cut_edge_epsilon: f64,
    /// How far tuned outer edges may reach beyond the sentence (seconds)
    pub edge_extra: f64,
    /// Length forced onto a tuned segment whose end fell before its start (seconds)
    pub min_tuned_length: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            cut_edge_epsilon: 0.03,
            edge_extra: 0.7,
            min_tuned_length: 0.05,
        }
    }
}

/// A segment resolved to absolute, playable times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    pub key: SegmentKey,
    pub sentence: SentenceId,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TimedSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Splits sentences at their cut times and applies fine-tune offsets
pub struct SegmentPlanBuilder {
    config: PlanConfig,
}

impl SegmentPlanBuilder {
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Cuts strictly inside the sentence, sorted, with near duplicates removed
    pub fn valid_cuts(&self, sentence: &SentenceSpan, cuts: &[f64]) -> Vec<f64> {
        let eps = self.config.cut_edge_epsilon;
        let mut inside: Vec<f64> = cuts
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t > sentence.start + eps && *t < sentence.end - eps)
            .collect();
        inside.sort_by(f64::total_cmp);
        inside.dedup_by(|b, a| *b - *a < eps);
        inside
    }

    /// Build the sub-segments of one sentence
    ///
    /// Text slices come from the edited text split at pause markers and are
    /// matched to time intervals by index; missing slices are empty.
    pub fn build_sub_segments(
        &self,
        sentence: &SentenceSpan,
        cuts: &[f64],
        edited_text: Option<&str>,
    ) -> Vec<SubSegment> {
        let cuts = self.valid_cuts(sentence, cuts);
        let mut bounds = Vec::with_capacity(cuts.len() + 2);
        bounds.push(sentence.start);
        bounds.extend(cuts);
        bounds.push(sentence.end);

        let pieces = fit_pieces(
            split_on_pause(edited_text.unwrap_or(&sentence.text)),
            bounds.len() - 1,
        );

        bounds
            .windows(2)
            .enumerate()
            .map(|(index, pair)| SubSegment {
                key: SegmentKey::sub(sentence.id, pair[0], pair[1]),
                index,
                base_start: pair[0],
                base_end: pair[1],
                text: pieces.get(index).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Apply fine-tunes to sub-segments
    ///
    /// Only the first start and the last end may reach `edge_extra` past the
    /// sentence; inner boundaries stay inside it.
    pub fn resolve_sub_segments(
        &self,
        sentence: &SentenceSpan,
        subs: &[SubSegment],
        tunes: &BTreeMap<SegmentKey, FineTune>,
    ) -> Vec<TimedSegment> {
        let last = subs.len().saturating_sub(1);
        subs.iter()
            .enumerate()
            .map(|(i, sub)| {
                let tune = tunes.get(&sub.key).copied().unwrap_or_default();
                let (start, end) = self.tuned_bounds(
                    sentence,
                    (sub.base_start, sub.base_end),
                    tune,
                    (i == 0, i == last),
                );
                TimedSegment {
                    key: sub.key,
                    sentence: sentence.id,
                    start,
                    end,
                    text: sub.text.clone(),
                }
            })
            .collect()
    }

    /// The whole sentence as one segment, using the tuned outer edges
    pub fn resolve_whole_sentence(
        &self,
        sentence: &SentenceSpan,
        subs: &[SubSegment],
        tunes: &BTreeMap<SegmentKey, FineTune>,
    ) -> TimedSegment {
        let resolved = self.resolve_sub_segments(sentence, subs, tunes);
        let start = resolved.first().map_or(sentence.start, |s| s.start);
        let end = resolved.last().map_or(sentence.end, |s| s.end);
        TimedSegment {
            key: SegmentKey::sub(sentence.id, sentence.start, sentence.end),
            sentence: sentence.id,
            start,
            end,
            text: sentence.text.clone(),
        }
    }

    /// Apply a fine-tune to a hard-word span; both edges may extend
    pub fn resolve_hard_word(
        &self,
        sentence: &SentenceSpan,
        span: &HardWordSpan,
        tune: FineTune,
    ) -> TimedSegment {
        let (start, end) =
            self.tuned_bounds(sentence, (span.base_start, span.base_end), tune, (true, true));
        TimedSegment {
            key: span.key,
            sentence: sentence.id,
            start,
            end,
            text: span.word.clone(),
        }
    }

    fn tuned_bounds(
        &self,
        sentence: &SentenceSpan,
        (base_start, base_end): (f64, f64),
        tune: FineTune,
        (outer_start, outer_end): (bool, bool),
    ) -> (f64, f64) {
        let extra = self.config.edge_extra;
        let lo = if outer_start {
            (sentence.start - extra).max(0.0)
        } else {
            sentence.start
        };
        let hi = if outer_end {
            sentence.end + extra
        } else {
            sentence.end
        };

        let start = (base_start + tune.start_offset()).clamp(lo, hi);
        let mut end = (base_end + tune.end_offset()).clamp(lo, hi);
        if end <= start {
            end = (start + self.config.min_tuned_length).min(hi);
        }
        (start, end)
    }
}

impl Default for SegmentPlanBuilder {
    fn default() -> Self {
        Self::new(PlanConfig::default())
    }
}

/// Match text pieces to `intervals` when some markers produced no cut
///
/// Markers whose cut was merged or dropped leave empty pieces, which go
/// first; any surplus after that joins the last piece.
fn fit_pieces(mut pieces: Vec<String>, intervals: usize) -> Vec<String> {
    if pieces.len() <= intervals {
        return pieces;
    }
    let mut surplus = pieces.len() - intervals;
    pieces.retain(|piece| {
        if surplus > 0 && piece.is_empty() {
            surplus -= 1;
            false
        } else {
            true
        }
    });
    if pieces.len() > intervals {
        let tail = pieces.split_off(intervals);
        if let Some(last) = pieces.last_mut() {
            let merged = join_words(
                std::iter::once(last.as_str()).chain(tail.iter().map(String::as_str)),
            );
            *last = merged;
        }
    }
    pieces
}
