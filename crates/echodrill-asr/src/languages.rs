//! Practice languages the recognizer can be asked for

use serde::Serialize;

/// Language information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// Code the user picks (e.g. "en", "zh-TW")
    pub code: &'static str,
    /// Name in the language itself
    pub name: &'static str,
    /// Code passed to the recognizer (may be shared by several entries)
    pub recognizer_code: &'static str,
    /// Written right to left
    pub rtl: bool,
}

const fn lang(
    code: &'static str,
    name: &'static str,
    recognizer_code: &'static str,
    rtl: bool,
) -> Language {
    Language {
        code,
        name,
        recognizer_code,
        rtl,
    }
}

/// Supported languages list
pub static SUPPORTED_LANGUAGES: &[Language] = &[
    lang("en", "English", "en", false),
    lang("zh", "简体中文", "zh", false),
    lang("zh-TW", "繁體中文", "zh", false),
    lang("yue", "粵語", "yue", false),
    lang("ja", "日本語", "ja", false),
    lang("ko", "한국어", "ko", false),
    lang("es", "Español", "es", false),
    lang("fr", "Français", "fr", false),
    lang("de", "Deutsch", "de", false),
    lang("it", "Italiano", "it", false),
    lang("pt", "Português", "pt", false),
    lang("ru", "Русский", "ru", false),
    lang("ar", "العربية", "ar", true),
    lang("he", "עברית", "he", true),
    lang("hi", "हिन्दी", "hi", false),
];

impl Language {
    /// Look up a language by user code or recognizer code, ignoring case
    pub fn get(code: &str) -> Option<&'static Language> {
        let code = code.trim();
        SUPPORTED_LANGUAGES
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .or_else(|| {
                SUPPORTED_LANGUAGES
                    .iter()
                    .find(|l| l.recognizer_code.eq_ignore_ascii_case(code))
            })
    }

    pub fn is_supported(code: &str) -> bool {
        Self::get(code).is_some()
    }

    /// Recognizer code for a user code
    pub fn to_recognizer_code(code: &str) -> Option<&'static str> {
        Self::get(code).map(|l| l.recognizer_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Language::get("ZH-tw").map(|l| l.code), Some("zh-TW"));
        assert_eq!(Language::to_recognizer_code("zh-TW"), Some("zh"));
        assert!(!Language::is_supported("tlh"));
    }

    #[test]
    fn test_recognizer_code_resolves_to_first_entry() {
        assert_eq!(Language::get("zh").map(|l| l.code), Some("zh"));
        assert!(Language::get("ar").is_some_and(|l| l.rtl));
    }
}
