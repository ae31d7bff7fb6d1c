//! Tokenisation and lexicons shared by the quality gate and verbal analyzers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = FILLER_WORDS
        .iter()
        .map(|f| f.replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).unwrap()
});

/// Hesitation markers in English and French.
pub const FILLER_WORDS: &[&str] = &[
    "um", "uh", "like", "you know", "basically", "actually", "euh", "ben", "donc",
];

/// Basic English + French stop list used when no NLP backend is available.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "been", "le", "la", "les", "un", "une", "des",
    "de", "et", "ou", "dans", "sur",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Returns `true` for words in [`STOP_WORDS`].  `word` must be lower-case.
pub fn is_stop_word(word: &str) -> bool {
    STOP_SET.contains(word)
}

/// Lower-cased `\w+` tokens in order of appearance.
pub fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Sentences split on runs of `.`, `!` and `?`, trimmed, empties dropped.
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Number of whole-word filler occurrences (case-insensitive).
pub fn count_fillers(text: &str) -> usize {
    FILLER.find_iter(text).count()
}

/// `1 - unique/total`; `0.0` for an empty list.
pub fn repetition_ratio<S: AsRef<str>>(tokens: &[S]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    1.0 - unique.len() as f64 / tokens.len() as f64
}

/// Returns `true` when the first character of `s` is upper-case.
pub fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}
