//! Caret-to-time mapping for marker-annotated sentence text
//!
//! Edited sentence text carries two marker glyphs: a pause marker that splits
//! playback, and a hard-word marker that, repeated 1-4 times, selects the next
//! words for focused practice. Every mapping works in a marker-stripped copy
//! of the text, so the time under the caret does not depend on how many
//! markers precede it.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::segmenter::join_words;
use crate::types::{HardWordSpan, SegmentKey, SentenceSpan, WordTiming};

/// Pause marker glyph
pub const PAUSE_MARKER: char = '\u{23F8}';
/// Hard-word marker glyph
pub const HARD_WORD_MARKER: char = '\u{2605}';
/// Alternate encoding of the hard-word marker some keyboards produce
pub const HARD_WORD_MARKER_VARIANT: char = '\u{2B50}';
/// Longest hard-word run honored; longer runs are clamped
pub const MAX_HARD_WORD_RUN: usize = 4;
/// Slack around the sentence bounds when selecting its words (seconds)
pub const WORD_WINDOW_EPSILON: f64 = 0.02;
/// Pause times closer than this collapse into one (seconds)
pub const PAUSE_DEDUP_SECONDS: f64 = 0.03;

const TEXT_STYLE_SELECTOR: char = '\u{FE0E}';
const EMOJI_STYLE_SELECTOR: char = '\u{FE0F}';

/// Marker kinds a user can insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Pause,
    HardWord,
}

impl Marker {
    pub fn glyph(&self) -> char {
        match self {
            Marker::Pause => PAUSE_MARKER,
            Marker::HardWord => HARD_WORD_MARKER,
        }
    }
}

/// Result of inserting a marker into edited text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerInsertion {
    pub text: String,
    /// Caret right after the inserted glyph (UTF-16 code units)
    pub caret_utf16: usize,
}

fn is_style_selector(c: char) -> bool {
    c == TEXT_STYLE_SELECTOR || c == EMOJI_STYLE_SELECTOR
}

fn is_hard_word_marker(c: char) -> bool {
    c == HARD_WORD_MARKER || c == HARD_WORD_MARKER_VARIANT
}

fn is_marker_char(c: char) -> bool {
    c == PAUSE_MARKER || is_hard_word_marker(c) || is_style_selector(c)
}

/// Remove every marker glyph and style selector
pub fn strip_markers(text: &str) -> String {
    text.chars().filter(|c| !is_marker_char(*c)).collect()
}

/// Split text at pause markers into trimmed, marker-free pieces
pub fn split_on_pause(text: &str) -> Vec<String> {
    text.split(PAUSE_MARKER)
        .map(|piece| strip_markers(piece).trim().to_string())
        .collect()
}

/// Convert a UTF-16 caret offset into a byte offset
///
/// Offsets past the end clamp to the end; an offset inside a surrogate pair
/// snaps back to the start of that character.
pub fn utf16_to_byte(text: &str, offset_utf16: usize) -> usize {
    let mut units = 0;
    for (byte, c) in text.char_indices() {
        if units >= offset_utf16 || units + c.len_utf16() > offset_utf16 {
            return byte;
        }
        units += c.len_utf16();
    }
    text.len()
}

/// Replace the selection `[start, end)` (UTF-16) with a marker glyph
pub fn insert_marker(
    text: &str,
    selection_utf16: Range<usize>,
    marker: Marker,
) -> MarkerInsertion {
    let a = utf16_to_byte(text, selection_utf16.start);
    let b = utf16_to_byte(text, selection_utf16.end);
    let (start, end) = (a.min(b), a.max(b));

    let mut edited = String::with_capacity(text.len() + 4);
    edited.push_str(&text[..start]);
    edited.push(marker.glyph());
    edited.push_str(&text[end..]);

    let caret_utf16 = text[..start].encode_utf16().count() + marker.glyph().len_utf16();
    MarkerInsertion {
        text: edited,
        caret_utf16,
    }
}

/// Number of pause markers and hard-word runs in the text
pub fn marker_counts(text: &str) -> (usize, usize) {
    let pauses = text.chars().filter(|c| *c == PAUSE_MARKER).count();
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        if is_hard_word_marker(c) {
            if !in_run {
                runs += 1;
            }
            in_run = true;
        } else if !is_style_selector(c) {
            in_run = false;
        }
    }
    (pauses, runs)
}

/// Words of one sentence located inside its marker-stripped text
///
/// Ranges and offsets are in UTF-16 code units of the stripped text.
struct WordLayout<'a> {
    words: Vec<&'a WordTiming>,
    ranges: Vec<Option<Range<usize>>>,
}

impl<'a> WordLayout<'a> {
    fn new(edited: &str, sentence: &SentenceSpan, words: &'a [WordTiming]) -> Self {
        let lo = sentence.start - WORD_WINDOW_EPSILON;
        let hi = sentence.end + WORD_WINDOW_EPSILON;
        let mut words: Vec<&WordTiming> = words
            .iter()
            .filter(|w| w.start >= lo && w.end <= hi)
            .collect();
        words.sort_by(|a, b| a.start.total_cmp(&b.start));

        // Forward search so repeated words resolve left to right.
        let clean = strip_markers(edited);
        let mut cursor = 0;
        let mut cursor_units = 0;
        let ranges = words
            .iter()
            .map(|word| {
                let needle = strip_markers(word.text.trim());
                if needle.is_empty() {
                    return None;
                }
                let found = clean[cursor..].find(&needle)?;
                let start = cursor_units + clean[cursor..cursor + found].encode_utf16().count();
                let end = start + needle.encode_utf16().count();
                cursor += found + needle.len();
                cursor_units = end;
                Some(start..end)
            })
            .collect();

        Self { words, ranges }
    }

    fn located(&self) -> impl Iterator<Item = (usize, &Range<usize>)> {
        self.ranges
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
    }

    /// Time for a clean-text offset
    fn time_at(&self, offset: usize) -> Option<f64> {
        let first = self.words.first()?;
        let last = self.words.last()?;

        let containing = self
            .located()
            .find(|(_, r)| r.start <= offset && offset <= r.end);
        let chosen = containing.or_else(|| {
            let mut best: Option<((usize, &Range<usize>), usize)> = None;
            for (i, r) in self.located() {
                let distance = if offset < r.start {
                    r.start - offset
                } else {
                    offset - r.end
                };
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some(((i, r), distance));
                }
            }
            best.map(|(hit, _)| hit)
        });

        let Some((index, range)) = chosen else {
            // Nothing could be located in the text.
            return Some(if offset == 0 { first.start } else { last.end });
        };

        let word = self.words[index];
        if offset >= range.end && offset > range.start {
            Some(word.end)
        } else {
            Some(word.start)
        }
    }

    /// First word whose range contains the offset or starts at or after it
    fn word_index_from(&self, offset: usize) -> Option<usize> {
        self.located()
            .find(|(_, r)| r.start >= offset || offset < r.end)
            .map(|(i, _)| i)
    }
}

/// UTF-16 length of the marker-stripped text before a byte offset
fn clean_units_before(edited: &str, byte: usize) -> usize {
    edited[..byte]
        .chars()
        .filter(|c| !is_marker_char(*c))
        .map(char::len_utf16)
        .sum()
}

/// Map a caret inside edited sentence text to an absolute audio time
///
/// Returns `None` only when no recognized word falls inside the sentence.
pub fn cursor_time(
    edited: &str,
    caret_utf16: usize,
    sentence: &SentenceSpan,
    words: &[WordTiming],
) -> Option<f64> {
    let byte = utf16_to_byte(edited, caret_utf16);
    let layout = WordLayout::new(edited, sentence, words);
    layout.time_at(clean_units_before(edited, byte))
}

/// Absolute times of every pause marker, sorted and de-duplicated
pub fn pause_times_from_text(
    edited: &str,
    sentence: &SentenceSpan,
    words: &[WordTiming],
) -> Vec<f64> {
    let layout = WordLayout::new(edited, sentence, words);
    let mut times: Vec<f64> = edited
        .char_indices()
        .filter(|(_, c)| *c == PAUSE_MARKER)
        .filter_map(|(byte, c)| layout.time_at(clean_units_before(edited, byte + c.len_utf8())))
        .collect();
    times.sort_by(f64::total_cmp);

    let mut deduped: Vec<f64> = Vec::with_capacity(times.len());
    for time in times {
        match deduped.last() {
            Some(last) if time - last < PAUSE_DEDUP_SECONDS => {}
            _ => deduped.push(time),
        }
    }
    deduped
}

/// Hard-word spans selected by marker runs, left to right
pub fn hard_word_spans_from_text(
    edited: &str,
    sentence: &SentenceSpan,
    words: &[WordTiming],
) -> Vec<HardWordSpan> {
    let layout = WordLayout::new(edited, sentence, words);
    let chars: Vec<(usize, char)> = edited.char_indices().collect();
    let mut spans = Vec::new();
    let mut seen: HashSet<SegmentKey> = HashSet::new();
    let mut i = 0;

    while i < chars.len() {
        if !is_hard_word_marker(chars[i].1) {
            i += 1;
            continue;
        }

        let mut run = 0;
        while i < chars.len() && (is_hard_word_marker(chars[i].1) || is_style_selector(chars[i].1))
        {
            if is_hard_word_marker(chars[i].1) {
                run += 1;
            }
            i += 1;
        }
        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }

        let byte = chars.get(i).map(|(b, _)| *b).unwrap_or(edited.len());
        let Some(first) = layout.word_index_from(clean_units_before(edited, byte)) else {
            continue;
        };
        let count = run.clamp(1, MAX_HARD_WORD_RUN);
        let last = (first + count - 1).min(layout.words.len() - 1);
        let selected = &layout.words[first..=last];

        let start = selected[0].start;
        let end = selected[selected.len() - 1].end;
        let key = SegmentKey::hard_word(sentence.id, start, end);
        if !seen.insert(key) {
            continue;
        }

        spans.push(HardWordSpan {
            key,
            index: spans.len(),
            base_start: start,
            base_end: end,
            word: join_words(selected.iter().map(|w| w.text.as_str())),
        });
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fox() -> (SentenceSpan, Vec<WordTiming>) {
        let words = vec![
            WordTiming::new("The", 1.0, 1.2),
            WordTiming::new("quick", 1.3, 1.6),
            WordTiming::new("brown", 1.7, 2.0),
            WordTiming::new("fox", 2.1, 2.4),
            WordTiming::new("jumps.", 2.5, 3.0),
        ];
        (SentenceSpan::new("The quick brown fox jumps.", 1.0, 3.0), words)
    }

    #[test]
    fn test_cursor_time_word_edges() {
        let (sentence, words) = fox();
        let text = sentence.text.clone();

        assert_eq!(cursor_time(&text, 0, &sentence, &words), Some(1.0));
        // right after "quick"
        assert_eq!(cursor_time(&text, 9, &sentence, &words), Some(1.6));
        // right before "brown"
        assert_eq!(cursor_time(&text, 10, &sentence, &words), Some(1.7));
        // inside "brown" snaps back to its start
        assert_eq!(cursor_time(&text, 12, &sentence, &words), Some(1.7));
        // past the end
        assert_eq!(cursor_time(&text, 500, &sentence, &words), Some(3.0));
    }

    #[test]
    fn test_cursor_time_ignores_preceding_markers() {
        let (sentence, words) = fox();
        let plain = cursor_time("The quick brown", 10, &sentence, &words);

        let inserted = insert_marker("The quick brown", 4..4, Marker::HardWord);
        let marked = format!("\u{23F8}{}", inserted.text);
        // caret before "brown", shifted by two glyphs
        assert_eq!(cursor_time(&marked, 12, &sentence, &words), plain);
    }

    #[test]
    fn test_insert_then_remove_marker_maps_to_same_time() {
        let (sentence, words) = fox();
        let text = sentence.text.clone();
        let before = cursor_time(&text, 9, &sentence, &words);

        let inserted = insert_marker(&text, 9..9, Marker::Pause);
        assert_eq!(inserted.caret_utf16, 10);
        let with_marker = cursor_time(&inserted.text, inserted.caret_utf16, &sentence, &words);
        let removed = strip_markers(&inserted.text);

        assert_eq!(with_marker, before);
        assert_eq!(cursor_time(&removed, 9, &sentence, &words), before);
    }

    #[test]
    fn test_repeated_words_resolve_left_to_right() {
        let words = vec![
            WordTiming::new("no", 0.0, 0.3),
            WordTiming::new("no", 0.5, 0.8),
            WordTiming::new("no.", 1.0, 1.3),
        ];
        let sentence = SentenceSpan::new("no no no.", 0.0, 1.3);
        assert_eq!(cursor_time("no no no.", 3, &sentence, &words), Some(0.5));
        assert_eq!(cursor_time("no no no.", 5, &sentence, &words), Some(0.8));
    }

    #[test]
    fn test_cursor_time_none_without_words() {
        let (sentence, _) = fox();
        assert_eq!(cursor_time("anything", 3, &sentence, &[]), None);

        let elsewhere = vec![WordTiming::new("late", 9.0, 9.5)];
        assert_eq!(cursor_time("anything", 3, &sentence, &elsewhere), None);
    }

    #[test]
    fn test_caret_between_words_picks_nearest_edge() {
        let words = vec![WordTiming::new("ab", 0.0, 0.5), WordTiming::new("cd", 1.0, 1.5)];
        let sentence = SentenceSpan::new("ab cd", 0.0, 1.5);

        // three spaces between the words; the caret touches neither
        assert_eq!(cursor_time("ab   cd", 4, &sentence, &words), Some(1.0));
        // equal distance goes to the earlier word
        assert_eq!(cursor_time("ab  cd", 3, &sentence, &words), Some(0.5));
        // distances count UTF-16 units, not bytes
        assert_eq!(cursor_time("ab \u{e9}  cd", 4, &sentence, &words), Some(0.5));
        assert_eq!(cursor_time("ab \u{3001}\u{3001} cd", 4, &sentence, &words), Some(0.5));
    }

    #[test]
    fn test_words_outside_window_are_ignored() {
        let (sentence, mut words) = fox();
        words.push(WordTiming::new("The", 3.5, 3.8));
        assert_eq!(cursor_time("The", 0, &sentence, &words), Some(1.0));
    }

    #[test]
    fn test_pause_times_sorted_and_deduplicated() {
        let (sentence, words) = fox();
        let text = "The quick\u{23F8}\u{23F8} brown fox\u{23F8} jumps.";
        assert_eq!(pause_times_from_text(text, &sentence, &words), vec![1.6, 2.4]);
    }

    #[test]
    fn test_pause_times_within_30ms_collapse() {
        let words = vec![WordTiming::new("a", 0.0, 0.5), WordTiming::new("b", 0.51, 1.0)];
        let sentence = SentenceSpan::new("a b", 0.0, 1.0);
        let text = "a\u{23F8} \u{23F8}b";
        assert_eq!(pause_times_from_text(text, &sentence, &words), vec![0.5]);
    }

    #[test]
    fn test_three_markers_select_three_words() {
        let (sentence, words) = fox();
        let text = "\u{2605}\u{2605}\u{2605} The quick brown fox jumps.";
        let spans = hard_word_spans_from_text(text, &sentence, &words);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].word, "The quick brown");
        assert_eq!((spans[0].base_start, spans[0].base_end), (1.0, 2.0));
        assert_eq!(spans[0].key.to_string(), "1000_3000|hw|1000_2000");
    }

    #[test]
    fn test_hard_word_runs_clamp_and_tolerate_variant() {
        let (sentence, words) = fox();
        let text = "The \u{2605}quick brown \u{2605}\u{2B50}\u{FE0F}fox jumps. \u{2605}";
        let spans = hard_word_spans_from_text(text, &sentence, &words);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].word, "quick");
        assert_eq!(spans[1].word, "fox jumps.");
        assert_eq!(spans[1].index, 1);

        let long_run = "The quick brown \u{2605}\u{2605}\u{2605}\u{2605}\u{2605}\u{2605}fox jumps.";
        let spans = hard_word_spans_from_text(long_run, &sentence, &words);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].word, "fox jumps.");
    }

    #[test]
    fn test_duplicate_hard_word_runs_are_merged() {
        let (sentence, words) = fox();
        let text = "The \u{2605} \u{2605}quick brown";
        let spans = hard_word_spans_from_text(text, &sentence, &words);
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_utf16_offsets() {
        let text = "a\u{1F600}b";
        assert_eq!(utf16_to_byte(text, 1), 1);
        assert_eq!(utf16_to_byte(text, 2), 1);
        assert_eq!(utf16_to_byte(text, 3), 5);
        assert_eq!(utf16_to_byte(text, 9), 6);
    }

    #[test]
    fn test_insert_marker_replaces_selection() {
        let inserted = insert_marker("hello world", 6..11, Marker::Pause);
        assert_eq!(inserted.text, "hello \u{23F8}");
        assert_eq!(inserted.caret_utf16, 7);
    }

    #[test]
    fn test_split_and_count() {
        let text = "one \u{2605}two\u{23F8} three \u{23F8}";
        assert_eq!(split_on_pause(text), vec!["one two", "three", ""]);
        assert_eq!(marker_counts(text), (2, 1));
    }
}
