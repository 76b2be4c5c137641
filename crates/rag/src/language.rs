//! Prompt language detection (spec §4.7): Devanagari script, Hinglish
//! (Latin-script Hindi), or English, decided from the raw prompt text
//! alone — no external language-ID model.

use once_cell::sync::Lazy;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Hinglish => "hi-Latn",
        }
    }
}

static HINGLISH_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "kitna", "kitne", "kharcha", "paisa", "paise", "rupaye", "rupya", "mera", "meri", "mujhe",
        "mere", "hua", "hue", "hui", "dikhao", "batao", "kab", "kaun", "kaunsa", "khata", "lena",
        "diya", "liya", "bheja", "mila", "transaction", "upi", "paytm", "saari", "kaha", "pichle",
    ]
    .into_iter()
    .collect()
});

/// Devanagari occupies `U+0900..=U+097F`; a single char in range is enough
/// to call the prompt Hindi (spec §4.7: "any Devanagari codepoint").
fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

fn hinglish_word_count(text: &str) -> usize {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| HINGLISH_WORDS.contains(*w))
        .count()
}

/// Devanagari beats everything; otherwise any recognized Hinglish keyword
/// at all calls it Hinglish; otherwise English.
pub fn detect_language(text: &str) -> Language {
    if has_devanagari(text) {
        return Language::Hindi;
    }
    if hinglish_word_count(text) >= 1 {
        return Language::Hinglish;
    }
    Language::English
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_text_is_hindi() {
        assert_eq!(detect_language("मेरा खर्चा कितना हुआ"), Language::Hindi);
    }

    #[test]
    fn hinglish_keywords_are_detected() {
        assert_eq!(detect_language("mujhe mera kharcha batao"), Language::Hinglish);
    }

    #[test]
    fn plain_english_is_english() {
        assert_eq!(detect_language("show me my spending last month"), Language::English);
    }

    #[test]
    fn single_hinglish_keyword_is_enough_to_flip_to_hinglish() {
        assert_eq!(detect_language("show me paisa trends"), Language::Hinglish);
    }

    #[test]
    fn pichle_mahine_ka_kharcha_is_hinglish() {
        assert_eq!(detect_language("pichle mahine ka kharcha"), Language::Hinglish);
    }
}
