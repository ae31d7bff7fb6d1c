//! Transcript quality gate.
//!
//! [`QualityGate::assess`] inspects a transcript and its engine confidence
//! and returns the set of [`QualityIssue`]s found plus a single penalty
//! multiplier that is later applied to the verbal scores.
//!
//! | Issue | Trigger |
//! |-------|---------|
//! | `LOW_CONFIDENCE` | confidence `< 0.5` |
//! | `MEDIUM_CONFIDENCE` | confidence in `[0.5, 0.7)` |
//! | `TOO_SHORT` | fewer than 10 characters after trimming |
//! | `REPETITIVE_TEXT` | more than 5 words, unique/total `< 0.3` |
//! | `NONSENSICAL_PATTERN` | more than 5 words, a nonsense pattern matches |
//! | `NO_PUNCTUATION` | more than 50 characters without any of `.!?,;:` |
//! | `EXCESSIVE_NUMBERS` | more than 5 words, digit-only words `> 30%` |
//!
//! Words are the whitespace-separated tokens of the lower-cased text.
//!
//! The penalty is tiered: any severe issue (`LOW_CONFIDENCE`,
//! `NONSENSICAL_PATTERN`) wins over any medium one (`MEDIUM_CONFIDENCE`,
//! `REPETITIVE_TEXT`), which wins over the remaining minor ones.  No issue
//! means `1.0`.
//!
//! ```rust
//! use voice_eval::analysis::{QualityGate, QualityIssue};
//!
//! let gate = QualityGate::default();
//! let qa = gate.assess("the a a the a a the", 0.3);
//! assert!(qa.issues.contains(&QualityIssue::LowConfidence));
//! assert!(qa.issues.contains(&QualityIssue::NonsensicalPattern));
//! assert_eq!(qa.penalty_factor, 0.4);
//! ```

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ARTICLE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(a|an|the)\s+(a|an|the)\s+(a|an|the)\b").unwrap());

static SHORT_WORD_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\w{1,2}\s+\w{1,2}\s+\w{1,2}\s+\w{1,2}\s+\w{1,2}\b").unwrap()
});

const MIN_TEXT_CHARS: usize = 10;
const LOW_CONFIDENCE: f64 = 0.5;
const MEDIUM_CONFIDENCE: f64 = 0.7;
const MIN_UNIQUE_RATIO: f64 = 0.3;
const MAX_NUMBER_RATIO: f64 = 0.3;
const MIN_WORDS_FOR_PATTERNS: usize = 5;
const MAX_UNPUNCTUATED_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// QualityIssue
// ---------------------------------------------------------------------------

/// One transcript defect detected by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityIssue {
    LowConfidence,
    MediumConfidence,
    RepetitiveText,
    NonsensicalPattern,
    TooShort,
    NoPunctuation,
    ExcessiveNumbers,
}

impl QualityIssue {
    /// Stable wire tag, e.g. `"LOW_CONFIDENCE"`.
    pub fn tag(&self) -> &'static str {
        match self {
            QualityIssue::LowConfidence => "LOW_CONFIDENCE",
            QualityIssue::MediumConfidence => "MEDIUM_CONFIDENCE",
            QualityIssue::RepetitiveText => "REPETITIVE_TEXT",
            QualityIssue::NonsensicalPattern => "NONSENSICAL_PATTERN",
            QualityIssue::TooShort => "TOO_SHORT",
            QualityIssue::NoPunctuation => "NO_PUNCTUATION",
            QualityIssue::ExcessiveNumbers => "EXCESSIVE_NUMBERS",
        }
    }

    /// Reviewer-facing explanation.
    pub fn description(&self) -> &'static str {
        match self {
            QualityIssue::LowConfidence => {
                "Transcription confidence is very low. Poor audio quality suspected."
            }
            QualityIssue::MediumConfidence => {
                "Transcription may have some errors. Check audio quality."
            }
            QualityIssue::RepetitiveText => "Too many repeated words detected.",
            QualityIssue::NonsensicalPattern => {
                "Unusual word patterns detected. May indicate transcription errors."
            }
            QualityIssue::TooShort => {
                "Transcription is too short. Audio may be unclear or silent."
            }
            QualityIssue::NoPunctuation => {
                "No punctuation detected. Transcription quality may be poor."
            }
            QualityIssue::ExcessiveNumbers => {
                "Too many numbers detected. May indicate audio noise."
            }
        }
    }

    fn is_severe(&self) -> bool {
        matches!(self, QualityIssue::LowConfidence | QualityIssue::NonsensicalPattern)
    }

    fn is_medium(&self) -> bool {
        matches!(self, QualityIssue::MediumConfidence | QualityIssue::RepetitiveText)
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// PenaltyFactors
// ---------------------------------------------------------------------------

/// Multipliers for each penalty tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyFactors {
    /// Applied when any severe issue is present.
    pub severe: f64,
    /// Applied when the worst issue is medium.
    pub medium: f64,
    /// Applied when only minor issues are present.
    pub minor: f64,
}

impl Default for PenaltyFactors {
    fn default() -> Self {
        Self {
            severe: 0.4,
            medium: 0.7,
            minor: 0.85,
        }
    }
}

impl PenaltyFactors {
    /// Penalty for an issue set; `1.0` when the set is empty.
    pub fn factor_for(&self, issues: &BTreeSet<QualityIssue>) -> f64 {
        if issues.iter().any(QualityIssue::is_severe) {
            self.severe
        } else if issues.iter().any(QualityIssue::is_medium) {
            self.medium
        } else if !issues.is_empty() {
            self.minor
        } else {
            1.0
        }
    }
}

// ---------------------------------------------------------------------------
// QualityAssessment
// ---------------------------------------------------------------------------

/// Result of one quality-gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub issues: BTreeSet<QualityIssue>,
    /// Multiplier in `(0, 1]` for the verbal sub-scores.
    pub penalty_factor: f64,
}

impl QualityAssessment {
    pub fn is_penalized(&self) -> bool {
        self.penalty_factor < 1.0
    }

    /// User-facing warning, present only when a penalty applies.
    pub fn warning(&self) -> Option<String> {
        self.is_penalized().then(|| {
            format!(
                "Scores reduced due to poor transcription quality (confidence: {:.0}%)",
                self.penalty_factor * 100.0
            )
        })
    }

    pub fn issue_tags(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.tag().to_string()).collect()
    }
}

// ---------------------------------------------------------------------------
// QualityGate
// ---------------------------------------------------------------------------

/// Pure, deterministic transcript validator.
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    penalties: PenaltyFactors,
}

impl QualityGate {
    pub fn new(penalties: PenaltyFactors) -> Self {
        Self { penalties }
    }

    pub fn penalties(&self) -> &PenaltyFactors {
        &self.penalties
    }

    /// Assess `text` transcribed with mean `confidence` in `[0, 1]`.  A NaN
    /// confidence counts as low.
    pub fn assess(&self, text: &str, confidence: f64) -> QualityAssessment {
        let mut issues = BTreeSet::new();

        if text.trim().is_empty() {
            issues.insert(QualityIssue::TooShort);
            return QualityAssessment {
                issues,
                penalty_factor: self.penalties.severe,
            };
        }

        if confidence.is_nan() || confidence < LOW_CONFIDENCE {
            issues.insert(QualityIssue::LowConfidence);
        } else if confidence < MEDIUM_CONFIDENCE {
            issues.insert(QualityIssue::MediumConfidence);
        }

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        if words.len() > MIN_WORDS_FOR_PATTERNS {
            let unique: HashSet<&str> = words.iter().copied().collect();
            if (unique.len() as f64 / words.len() as f64) < MIN_UNIQUE_RATIO {
                issues.insert(QualityIssue::RepetitiveText);
            }

            if is_nonsensical(&lowered, &words) {
                issues.insert(QualityIssue::NonsensicalPattern);
            }
        }

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            issues.insert(QualityIssue::TooShort);
        }

        if text.chars().count() > MAX_UNPUNCTUATED_CHARS
            && !text.contains(['.', '!', '?', ',', ';', ':'])
        {
            issues.insert(QualityIssue::NoPunctuation);
        }

        if words.len() > MIN_WORDS_FOR_PATTERNS {
            let numeric = words
                .iter()
                .filter(|w| w.chars().all(char::is_numeric))
                .count();
            if numeric as f64 / words.len() as f64 > MAX_NUMBER_RATIO {
                issues.insert(QualityIssue::ExcessiveNumbers);
            }
        }

        let penalty_factor = self.penalties.factor_for(&issues);
        if penalty_factor < 1.0 {
            log::debug!("quality gate: {issues:?} → penalty {penalty_factor}");
        }

        QualityAssessment {
            issues,
            penalty_factor,
        }
    }
}

/// Nonsense patterns, checked in order; the first hit wins.
fn is_nonsensical(lowered: &str, words: &[&str]) -> bool {
    repeated_and_chain(words) || ARTICLE_RUN.is_match(lowered) || SHORT_WORD_RUN.is_match(lowered)
}

/// Matches `\b(\w+)\s+and\s+\1\s+and\b` over whitespace tokens.
fn repeated_and_chain(words: &[&str]) -> bool {
    words.windows(4).any(|w| {
        let head = trailing_word(w[0]);
        !head.is_empty()
            && w[1] == "and"
            && w[2] == head
            && w[3]
                .strip_prefix("and")
                .is_some_and(|rest| !rest.starts_with(is_word_char))
    })
}

fn trailing_word(token: &str) -> &str {
    let start = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map_or(token.len(), |(i, _)| i);
    &token[start..]
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gate() -> QualityGate {
        QualityGate::default()
    }

    fn issues(text: &str, confidence: f64) -> Vec<QualityIssue> {
        gate().assess(text, confidence).issues.into_iter().collect()
    }

    #[test]
    fn clean_transcript_has_no_penalty() {
        let qa = gate().assess(
            "Yesterday I walked through the old town and visited the museum.",
            0.92,
        );
        assert!(qa.issues.is_empty());
        assert_eq!(qa.penalty_factor, 1.0);
        assert_eq!(qa.warning(), None);
    }

    #[test]
    fn empty_text_short_circuits() {
        let qa = gate().assess("   ", 0.99);
        assert_eq!(qa.issues.into_iter().collect::<Vec<_>>(), vec![QualityIssue::TooShort]);
        assert_eq!(qa.penalty_factor, 0.4);
    }

    #[test]
    fn confidence_tiers() {
        let text = "A perfectly reasonable sentence about travelling abroad.";
        assert_eq!(issues(text, 0.3), vec![QualityIssue::LowConfidence]);
        assert_eq!(issues(text, 0.6), vec![QualityIssue::MediumConfidence]);
        assert!(issues(text, 0.7).is_empty());
    }

    #[test]
    fn nan_confidence_is_low() {
        let qa = gate().assess(
            "A perfectly reasonable sentence about travelling abroad.",
            f64::NAN,
        );
        assert!(qa.issues.contains(&QualityIssue::LowConfidence));
        assert_eq!(qa.penalty_factor, 0.4);
    }

    #[test]
    fn low_confidence_nonsense_is_severe() {
        let qa = gate().assess("the a a the a a the", 0.3);
        assert!(qa.issues.contains(&QualityIssue::LowConfidence));
        assert!(qa.issues.contains(&QualityIssue::NonsensicalPattern));
        assert_eq!(qa.penalty_factor, 0.4);
    }

    #[test]
    fn repetitive_text_is_medium() {
        let qa = gate().assess("hello hello hello hello hello hello hello hello", 0.95);
        assert_eq!(qa.issues.iter().copied().collect::<Vec<_>>(), vec![QualityIssue::RepetitiveText]);
        assert_eq!(qa.penalty_factor, 0.7);
    }

    #[test]
    fn short_text_is_minor() {
        let qa = gate().assess("Bonjour", 0.9);
        assert_eq!(qa.issues.iter().copied().collect::<Vec<_>>(), vec![QualityIssue::TooShort]);
        assert_eq!(qa.penalty_factor, 0.85);
    }

    #[test]
    fn long_unpunctuated_text_is_minor() {
        let qa = gate().assess(
            "we went to the market early in the morning and bought fresh bread",
            0.9,
        );
        assert_eq!(qa.issues.iter().copied().collect::<Vec<_>>(), vec![QualityIssue::NoPunctuation]);
        assert_eq!(qa.penalty_factor, 0.85);
    }

    #[test]
    fn excessive_numbers_detected() {
        let qa = gate().assess("I counted 12 34 56 birds today", 0.9);
        assert!(qa.issues.contains(&QualityIssue::ExcessiveNumbers));
        assert_eq!(qa.penalty_factor, 0.85);
    }

    #[test]
    fn word_patterns_need_more_than_five_words() {
        // Five tiny words and an article run, but only five words in total.
        assert_eq!(issues("a an the of it", 0.9), Vec::<QualityIssue>::new());
        assert_eq!(issues("1 2 3", 0.9), vec![QualityIssue::TooShort]);
    }

    #[test]
    fn repeated_and_chain_is_nonsensical() {
        assert!(issues("I like cats and cats and dogs very much", 0.9)
            .contains(&QualityIssue::NonsensicalPattern));
        assert!(issues("we saw dog and cat and dog and dog and, then left", 0.9)
            .contains(&QualityIssue::NonsensicalPattern));
    }

    #[test]
    fn distinct_and_chain_is_fine() {
        assert!(!issues("We bought bread and cheese and wine for dinner", 0.9)
            .contains(&QualityIssue::NonsensicalPattern));
    }

    #[test]
    fn run_of_tiny_words_is_nonsensical() {
        assert!(issues("so if we do it at my place tonight", 0.9)
            .contains(&QualityIssue::NonsensicalPattern));
    }

    #[test]
    fn warning_reports_penalty_percentage() {
        let qa = gate().assess("hello hello hello hello hello hello hello hello", 0.95);
        assert_eq!(
            qa.warning().as_deref(),
            Some("Scores reduced due to poor transcription quality (confidence: 70%)")
        );
    }

    #[test]
    fn custom_penalties_are_used() {
        let gate = QualityGate::new(PenaltyFactors {
            severe: 0.1,
            medium: 0.5,
            minor: 0.9,
        });
        assert_eq!(gate.assess("", 1.0).penalty_factor, 0.1);
        assert_eq!(gate.assess("Bonjour", 1.0).penalty_factor, 0.9);
    }

    #[test]
    fn issue_tags_serialize_screaming_snake() {
        let json = serde_json::to_string(&QualityIssue::ExcessiveNumbers).unwrap();
        assert_eq!(json, "\"EXCESSIVE_NUMBERS\"");
        for issue in [
            QualityIssue::LowConfidence,
            QualityIssue::RepetitiveText,
            QualityIssue::NonsensicalPattern,
            QualityIssue::NoPunctuation,
        ] {
            assert_eq!(serde_json::to_string(&issue).unwrap(), format!("\"{}\"", issue.tag()));
            assert!(!issue.description().is_empty());
        }
    }

    #[test]
    fn assessment_is_deterministic() {
        let a = gate().assess("the the the cat sat on a mat", 0.55);
        let b = gate().assess("the the the cat sat on a mat", 0.55);
        assert_eq!(a, b);
    }

    #[test]
    fn trailing_word_takes_word_run() {
        assert_eq!(trailing_word("(book"), "book");
        assert_eq!(trailing_word("book,"), "");
        assert_eq!(trailing_word("a-b"), "b");
    }

    proptest! {
        #[test]
        fn assessment_is_deterministic_for_any_input(text in any::<String>(), confidence in 0.0f64..=1.0) {
            prop_assert_eq!(gate().assess(&text, confidence), gate().assess(&text, confidence));
        }

        #[test]
        fn penalty_is_one_of_the_tiers(text in any::<String>(), confidence in 0.0f64..=1.0) {
            let qa = gate().assess(&text, confidence);
            prop_assert!([1.0, 0.85, 0.7, 0.4].contains(&qa.penalty_factor));
            prop_assert_eq!(qa.is_penalized(), !qa.issues.is_empty());
        }

        #[test]
        fn long_repeated_word_is_at_least_medium(
            word in "[a-z]{1,8}",
            count in 6usize..3_000,
            confidence in 0.0f64..=1.0,
        ) {
            let text = vec![word.as_str(); count].join(" ");
            let qa = gate().assess(&text, confidence);
            prop_assert!(qa.issues.contains(&QualityIssue::RepetitiveText));
            prop_assert!(qa.penalty_factor <= 0.7);
        }
    }
}
