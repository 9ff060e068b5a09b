//! Token to word normalization

use std::sync::OnceLock;

use echodrill_core::WordTiming;
use regex::Regex;

use crate::recognizer::RecognizedToken;

fn special_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, cannot fail to compile
    RE.get_or_init(|| Regex::new(r"<\|[^|]*\|>|\[_[A-Z]+_?\d*\]").expect("valid regex"))
}

/// Scripts written without spaces, where each token stands on its own
fn is_unspaced(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'    // kana
        | '\u{3400}'..='\u{4DBF}'  // CJK extension A
        | '\u{4E00}'..='\u{9FFF}'  // CJK unified
        | '\u{F900}'..='\u{FAFF}'  // CJK compatibility
        | '\u{0E00}'..='\u{0E7F}'  // Thai
    )
}

fn is_punctuation(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_punctuation() || "。，、？！：；…「」『』".contains(c))
}

/// Join recognizer tokens into timed words
///
/// Special tokens are dropped. A token starting with whitespace opens a new
/// word, while continuation pieces and trailing punctuation extend the
/// previous one. Tokens of unspaced scripts are kept as separate words.
/// The result is sorted by start and every `end` is at least its `start`.
pub fn merge_tokens_into_words(tokens: &[RecognizedToken]) -> Vec<WordTiming> {
    let mut words: Vec<WordTiming> = Vec::new();
    let mut open = false;

    for token in tokens {
        let cleaned = special_tokens().replace_all(&token.text, "");
        if cleaned.trim().is_empty() || !token.start.is_finite() || !token.end.is_finite() {
            continue;
        }

        let starts_word = cleaned.starts_with(char::is_whitespace);
        let piece = cleaned.trim();
        let unspaced = piece.chars().any(is_unspaced);

        let extend = !words.is_empty()
            && (is_punctuation(piece) || (open && !starts_word && !unspaced));

        match words.last_mut() {
            Some(last) if extend => {
                last.text.push_str(piece);
                last.end = last.end.max(token.end);
            }
            _ => words.push(WordTiming::new(piece, token.start, token.end)),
        }
        open = !unspaced;
    }

    words.sort_by(|a, b| a.start.total_cmp(&b.start));
    for word in &mut words {
        if word.end < word.start {
            word.end = word.start;
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(words: &[WordTiming]) -> Vec<&str> {
        words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn test_sub_word_pieces_are_joined() {
        let tokens = vec![
            RecognizedToken::new("<|startoftranscript|>", 0.0, 0.0),
            RecognizedToken::new(" Good", 0.0, 0.3),
            RecognizedToken::new(" mor", 0.4, 0.6),
            RecognizedToken::new("ning", 0.6, 0.9),
            RecognizedToken::new(".", 0.9, 0.95),
            RecognizedToken::new("<|endoftext|>", 1.0, 1.0),
        ];
        let words = merge_tokens_into_words(&tokens);
        assert_eq!(texts(&words), vec!["Good", "morning."]);
        assert_eq!(words[1].start, 0.4);
        assert_eq!(words[1].end, 0.95);
    }

    #[test]
    fn test_unspaced_tokens_stay_separate() {
        let tokens = vec![
            RecognizedToken::new("你", 0.0, 0.2),
            RecognizedToken::new("好", 0.2, 0.4),
            RecognizedToken::new("。", 0.4, 0.45),
        ];
        let words = merge_tokens_into_words(&tokens);
        assert_eq!(texts(&words), vec!["你", "好。"]);
    }

    #[test]
    fn test_order_and_inverted_times_are_repaired() {
        let tokens = vec![
            RecognizedToken::new(" later", 2.0, 1.5),
            RecognizedToken::new(" first", 0.5, 0.8),
            RecognizedToken::new("[_BEG_]", 0.0, 0.0),
        ];
        let words = merge_tokens_into_words(&tokens);
        assert_eq!(texts(&words), vec!["first", "later"]);
        assert_eq!(words[1].end, 2.0);
    }
}
