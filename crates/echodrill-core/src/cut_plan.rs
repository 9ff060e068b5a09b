//! Per-item annotation record

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::markers::{hard_word_spans_from_text, pause_times_from_text};
use crate::plan::SegmentPlanBuilder;
use crate::settings::PlaybackSettings;
use crate::types::{
    FineTune, HardWordSpan, SegmentKey, SegmentKind, SentenceId, SentenceSpan, SubSegment,
    WordTiming,
};

/// Everything the user annotated on one audio item
///
/// Saved wholesale; missing fields decode to their defaults and
/// [`CutPlan::sanitize`] re-clamps the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutPlan {
    /// Edited sentence text, including marker glyphs
    pub sentence_edits: BTreeMap<SentenceId, String>,
    /// Cut times derived from the pause markers of each edit
    pub cuts: BTreeMap<SentenceId, Vec<f64>>,
    /// Fine-tunes of sub-segments
    pub sub_tunes: BTreeMap<SegmentKey, FineTune>,
    /// Fine-tunes of hard-word spans
    pub hard_word_tunes: BTreeMap<SegmentKey, FineTune>,
    pub settings: PlaybackSettings,
    /// Language the transcript was recognized in
    pub language: Option<String>,
    /// Sentences the user flagged for practice
    pub flagged: BTreeSet<SentenceId>,
    pub updated_at: DateTime<Utc>,
}

impl Default for CutPlan {
    fn default() -> Self {
        Self {
            sentence_edits: BTreeMap::new(),
            cuts: BTreeMap::new(),
            sub_tunes: BTreeMap::new(),
            hard_word_tunes: BTreeMap::new(),
            settings: PlaybackSettings::default(),
            language: None,
            flagged: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }
}

impl CutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text of a sentence: the edit if there is one, else the original
    pub fn edited_text<'a>(&'a self, sentence: &'a SentenceSpan) -> &'a str {
        self.sentence_edits
            .get(&sentence.id)
            .map(String::as_str)
            .unwrap_or(&sentence.text)
    }

    pub fn cuts_for(&self, id: &SentenceId) -> &[f64] {
        self.cuts.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Store a sentence edit and re-derive its cut set from the text
    ///
    /// Tunes of sub-segments and hard words that no longer exist are dropped.
    pub fn apply_sentence_edit(
        &mut self,
        sentence: &SentenceSpan,
        text: &str,
        words: &[WordTiming],
    ) {
        if text == sentence.text {
            self.clear_sentence_edit(&sentence.id);
            return;
        }

        let builder = SegmentPlanBuilder::default();
        let cuts = builder.valid_cuts(sentence, &pause_times_from_text(text, sentence, words));
        self.sentence_edits.insert(sentence.id, text.to_string());
        if cuts.is_empty() {
            self.cuts.remove(&sentence.id);
        } else {
            self.cuts.insert(sentence.id, cuts);
        }

        let live_subs: BTreeSet<SegmentKey> = self
            .sub_segments(sentence)
            .iter()
            .map(|s| s.key)
            .collect();
        let live_words: BTreeSet<SegmentKey> = self
            .hard_word_spans(sentence, words)
            .iter()
            .map(|s| s.key)
            .collect();
        self.sub_tunes
            .retain(|k, _| k.sentence != sentence.id || live_subs.contains(k));
        self.hard_word_tunes
            .retain(|k, _| k.sentence != sentence.id || live_words.contains(k));

        self.touch();
    }

    /// Forget every annotation of one sentence except its flag
    pub fn clear_sentence_edit(&mut self, id: &SentenceId) {
        self.sentence_edits.remove(id);
        self.cuts.remove(id);
        self.sub_tunes.retain(|k, _| k.sentence != *id);
        self.hard_word_tunes.retain(|k, _| k.sentence != *id);
        self.touch();
    }

    /// Sub-segments of a sentence under the current cuts and text
    pub fn sub_segments(&self, sentence: &SentenceSpan) -> Vec<SubSegment> {
        SegmentPlanBuilder::default().build_sub_segments(
            sentence,
            self.cuts_for(&sentence.id),
            Some(self.edited_text(sentence)),
        )
    }

    /// Hard-word spans marked in the current text of a sentence
    pub fn hard_word_spans(
        &self,
        sentence: &SentenceSpan,
        words: &[WordTiming],
    ) -> Vec<HardWordSpan> {
        match self.sentence_edits.get(&sentence.id) {
            Some(text) => hard_word_spans_from_text(text, sentence, words),
            None => Vec::new(),
        }
    }

    /// Flip the flag of a sentence, returning the new state
    pub fn toggle_flag(&mut self, id: SentenceId) -> bool {
        let flagged = if self.flagged.remove(&id) {
            false
        } else {
            self.flagged.insert(id);
            true
        };
        self.touch();
        flagged
    }

    pub fn is_flagged(&self, id: &SentenceId) -> bool {
        self.flagged.contains(id)
    }

    pub fn tune_for(&self, key: &SegmentKey) -> FineTune {
        self.tunes(key.kind).get(key).copied().unwrap_or_default()
    }

    /// Store a fine-tune, clamped; zero tunes are not kept
    pub fn set_tune(&mut self, key: SegmentKey, tune: FineTune) {
        let tune = tune.clamped();
        let tunes = self.tunes_mut(key.kind);
        if tune.is_zero() {
            tunes.remove(&key);
        } else {
            tunes.insert(key, tune);
        }
        self.touch();
    }

    /// Add deltas to a segment's offsets, returning the stored result
    pub fn nudge_tune(&mut self, key: SegmentKey, start_delta: f64, end_delta: f64) -> FineTune {
        let tune = self.tune_for(&key).nudged(start_delta, end_delta);
        self.set_tune(key, tune);
        tune
    }

    /// Re-clamp everything after decoding
    pub fn sanitize(&mut self) {
        self.settings.sanitize();
        for tune in self.sub_tunes.values_mut().chain(self.hard_word_tunes.values_mut()) {
            *tune = tune.clamped();
        }
        self.sub_tunes.retain(|k, t| k.kind == SegmentKind::Sub && !t.is_zero());
        self.hard_word_tunes
            .retain(|k, t| k.kind == SegmentKind::HardWord && !t.is_zero());
        for cuts in self.cuts.values_mut() {
            cuts.retain(|t| t.is_finite());
            cuts.sort_by(f64::total_cmp);
            cuts.dedup();
        }
        self.cuts.retain(|_, cuts| !cuts.is_empty());
        self.language = self
            .language
            .take()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn tunes(&self, kind: SegmentKind) -> &BTreeMap<SegmentKey, FineTune> {
        match kind {
            SegmentKind::Sub => &self.sub_tunes,
            SegmentKind::HardWord => &self.hard_word_tunes,
        }
    }

    fn tunes_mut(&mut self, kind: SegmentKind) -> &mut BTreeMap<SegmentKey, FineTune> {
        match kind {
            SegmentKind::Sub => &mut self.sub_tunes,
            SegmentKind::HardWord => &mut self.hard_word_tunes,
        }
    }
}
