//! Verbal sub-scores: fluency, vocabulary and structure.
//!
//! Two strategies implement the same contract:
//!
//! * [`FullNlpAnalyzer`] works on an [`AnnotatedDoc`] from an [`Annotator`]
//!   (POS tags, dependency labels, lemmas).
//! * [`BasicAnalyzer`] uses regex tokenisation and a fixed stop list.
//!
//! [`VerbalAnalyzers::detect`] picks one per language at start-up.  Scoring
//! code never checks which backend is installed; it matches on
//! [`VerbalAnalyzer`].  A full analyzer whose backend fails at request time
//! degrades that single request to the basic strategy and says so in
//! [`VerbalDetails::note`].
//!
//! All three scores start at 50 and are clamped to `[0, 100]` before the
//! quality penalty is applied by [`VerbalScores::penalize`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::nlp::{AnnotatedDoc, AnnotatedToken, Annotator, NlpError};
use crate::analysis::quality_gate::{QualityAssessment, QualityIssue};
use crate::analysis::stats::{clamp_score, mean, std_dev};
use crate::analysis::text;
use crate::language::Language;

const BASE_SCORE: f64 = 50.0;
const BASIC_NOTE: &str = "Using fallback NLP (full NLP backend not available)";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NlpBackend {
    Full,
    Basic,
}

/// Counts reported alongside the verbal scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbalDetails {
    pub backend: NlpBackend,
    pub word_count: usize,
    pub sentence_count: usize,
    pub unique_words: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Unpenalised verbal triad, each in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbalScores {
    pub fluency: f64,
    pub vocabulary: f64,
    pub structure: f64,
    pub details: VerbalDetails,
}

/// Verbal triad after the quality penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbalAssessment {
    pub fluency: f64,
    pub vocabulary: f64,
    pub structure: f64,
    pub details: VerbalDetails,
    pub penalty_factor: f64,
    /// Present whenever `penalty_factor < 1.0`.
    pub quality_warning: Option<String>,
    /// Every issue the quality gate detected, penalised or not.
    pub quality_issues: Vec<QualityIssue>,
}

impl VerbalAssessment {
    pub fn verbal_score(&self) -> f64 {
        (self.fluency + self.vocabulary + self.structure) / 3.0
    }
}

impl VerbalScores {
    /// Apply the quality penalty exactly once.
    pub fn penalize(self, quality: &QualityAssessment) -> VerbalAssessment {
        let factor = quality.penalty_factor;
        VerbalAssessment {
            fluency: clamp_score(self.fluency) * factor,
            vocabulary: clamp_score(self.vocabulary) * factor,
            structure: clamp_score(self.structure) * factor,
            details: self.details,
            penalty_factor: factor,
            quality_warning: quality.warning(),
            quality_issues: quality.issues.iter().copied().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared scoring rules
// ---------------------------------------------------------------------------

fn word_count_bonus(word_count: usize) -> f64 {
    match word_count {
        100..=300 => 20.0,
        50..=99 | 301..=500 => 10.0,
        _ => 0.0,
    }
}

fn sentence_length_bonus(mean_len: f64, varied: bool) -> f64 {
    if (10.0..=20.0).contains(&mean_len) && varied {
        15.0
    } else if (5.0..10.0).contains(&mean_len) || (mean_len > 20.0 && mean_len <= 30.0) {
        5.0
    } else {
        0.0
    }
}

fn filler_penalty(raw: &str) -> f64 {
    (text::count_fillers(raw) as f64 * 2.0).min(20.0)
}

fn lexical_diversity_bonus(unique: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (unique as f64 / total as f64 * 30.0).min(25.0)
}

fn word_length_bonus(avg_len: f64) -> f64 {
    if avg_len >= 5.0 {
        15.0
    } else if avg_len >= 4.0 {
        10.0
    } else if avg_len >= 3.0 {
        5.0
    } else {
        0.0
    }
}

fn char_len(s: &str) -> f64 {
    s.chars().count() as f64
}

// ---------------------------------------------------------------------------
// BasicAnalyzer
// ---------------------------------------------------------------------------

/// Regex tokenisation with a built-in stop list.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAnalyzer;

impl BasicAnalyzer {
    pub fn analyze(&self, raw: &str) -> VerbalScores {
        let sentences = text::sentences(raw);
        let words = text::words(raw);
        let non_stop: Vec<&str> = words
            .iter()
            .map(String::as_str)
            .filter(|w| !text::is_stop_word(w))
            .collect();
        let content: Vec<&str> = non_stop
            .iter()
            .copied()
            .filter(|w| w.chars().count() > 2)
            .collect();
        let unique: HashSet<&str> = content.iter().copied().collect();

        // Fluency
        let mut fluency = BASE_SCORE + word_count_bonus(words.len());
        if !sentences.is_empty() {
            let mean_len = words.len() as f64 / sentences.len() as f64;
            fluency += sentence_length_bonus(mean_len, true);
        }
        fluency -= filler_penalty(raw);
        fluency -= text::repetition_ratio(&non_stop) * 15.0;

        // Vocabulary
        let mut vocabulary = BASE_SCORE + lexical_diversity_bonus(unique.len(), content.len());
        if !content.is_empty() {
            let lengths: Vec<f64> = content.iter().map(|w| char_len(w)).collect();
            vocabulary += word_length_bonus(mean(&lengths));
        }

        // Structure
        let mut structure = BASE_SCORE;
        if !sentences.is_empty() {
            let lengths: HashSet<usize> = sentences
                .iter()
                .map(|s| s.split_whitespace().count())
                .collect();
            if lengths.len() > 1 {
                structure += 15.0;
            }
            let capitalised = sentences.iter().filter(|s| text::starts_uppercase(s)).count();
            structure += capitalised as f64 / sentences.len() as f64 * 20.0;
        }
        if raw.contains(['.', '!', '?', ',', ';']) {
            structure += 15.0;
        }

        VerbalScores {
            fluency: clamp_score(fluency),
            vocabulary: clamp_score(vocabulary),
            structure: clamp_score(structure),
            details: VerbalDetails {
                backend: NlpBackend::Basic,
                word_count: words.len(),
                sentence_count: sentences.len(),
                unique_words: unique.len(),
                note: Some(BASIC_NOTE.to_string()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// FullNlpAnalyzer
// ---------------------------------------------------------------------------

/// Scores an annotated document.
#[derive(Clone)]
pub struct FullNlpAnalyzer {
    annotator: Arc<dyn Annotator>,
}

impl std::fmt::Debug for FullNlpAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullNlpAnalyzer").finish_non_exhaustive()
    }
}

impl FullNlpAnalyzer {
    pub fn new(annotator: Arc<dyn Annotator>) -> Self {
        Self { annotator }
    }

    pub async fn analyze(&self, raw: &str, language: Language) -> Result<VerbalScores, NlpError> {
        let doc = self.annotator.annotate(raw, language).await?;
        Ok(Self::score(&doc, raw))
    }

    /// Score an already-annotated document.
    pub fn score(doc: &AnnotatedDoc, raw: &str) -> VerbalScores {
        let words: Vec<&AnnotatedToken> = doc.tokens().filter(|t| !t.is_punct).collect();
        let content: Vec<&AnnotatedToken> = words.iter().copied().filter(|t| !t.is_stop).collect();
        let unique_lemmas: HashSet<String> =
            content.iter().map(|t| t.lemma.to_lowercase()).collect();

        VerbalScores {
            fluency: clamp_score(Self::fluency(doc, raw, &words, &content)),
            vocabulary: clamp_score(Self::vocabulary(&content, unique_lemmas.len())),
            structure: clamp_score(Self::structure(doc)),
            details: VerbalDetails {
                backend: NlpBackend::Full,
                word_count: words.len(),
                sentence_count: doc.sentences.len(),
                unique_words: unique_lemmas.len(),
                note: None,
            },
        }
    }

    fn fluency(
        doc: &AnnotatedDoc,
        raw: &str,
        words: &[&AnnotatedToken],
        content: &[&AnnotatedToken],
    ) -> f64 {
        let mut score = BASE_SCORE + word_count_bonus(words.len());
        if words.len() < 50 {
            score -= 10.0;
        }

        let lengths: Vec<f64> = doc
            .sentences
            .iter()
            .map(|s| s.tokens.iter().filter(|t| !t.is_punct).count() as f64)
            .collect();
        if !lengths.is_empty() {
            score += sentence_length_bonus(mean(&lengths), std_dev(&lengths) > 3.0);
        }

        score -= filler_penalty(raw);

        let lowered: Vec<String> = content.iter().map(|t| t.text.to_lowercase()).collect();
        score -= text::repetition_ratio(&lowered) * 15.0;
        score
    }

    fn vocabulary(content: &[&AnnotatedToken], unique_lemmas: usize) -> f64 {
        if content.is_empty() {
            return 0.0;
        }

        let mut score = BASE_SCORE + lexical_diversity_bonus(unique_lemmas, content.len());

        let lengths: Vec<f64> = content.iter().map(|t| char_len(&t.text)).collect();
        score += word_length_bonus(mean(&lengths));

        let tags: HashSet<&str> = content.iter().map(|t| t.pos.as_str()).collect();
        score += (tags.len() as f64 / 10.0 * 15.0).min(10.0);
        score
    }

    fn structure(doc: &AnnotatedDoc) -> f64 {
        let sentences = &doc.sentences;
        if sentences.is_empty() {
            return 0.0;
        }
        let n = sentences.len() as f64;

        let complete = sentences
            .iter()
            .filter(|s| {
                s.tokens.iter().any(|t| t.pos == "VERB")
                    && s.tokens.iter().any(|t| t.dep == "nsubj" || t.dep == "nsubjpass")
            })
            .count();

        let patterns: HashSet<String> = sentences
            .iter()
            .map(|s| {
                s.tokens
                    .iter()
                    .filter(|t| !t.is_punct)
                    .take(5)
                    .map(|t| t.pos.as_str())
                    .collect::<Vec<_>>()
                    .join("-")
            })
            .collect();

        let proper = sentences
            .iter()
            .filter(|s| match (s.tokens.first(), s.tokens.last()) {
                (Some(first), Some(last)) => text::starts_uppercase(&first.text) && last.is_punct,
                _ => false,
            })
            .count();

        BASE_SCORE
            + complete as f64 / n * 25.0
            + (patterns.len() as f64 / n * 15.0).min(15.0)
            + proper as f64 / n * 10.0
    }
}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// One verbal-analysis strategy.
#[derive(Debug, Clone)]
pub enum VerbalAnalyzer {
    Full(FullNlpAnalyzer),
    Basic(BasicAnalyzer),
}

impl VerbalAnalyzer {
    pub fn backend(&self) -> NlpBackend {
        match self {
            VerbalAnalyzer::Full(_) => NlpBackend::Full,
            VerbalAnalyzer::Basic(_) => NlpBackend::Basic,
        }
    }

    /// Unpenalised scores for `raw`.
    pub async fn analyze(&self, raw: &str, language: Language) -> VerbalScores {
        match self {
            VerbalAnalyzer::Basic(basic) => basic.analyze(raw),
            VerbalAnalyzer::Full(full) => match full.analyze(raw, language).await {
                Ok(scores) => scores,
                Err(e) => {
                    log::warn!("full NLP analysis failed ({e}); using basic analysis");
                    let mut scores = BasicAnalyzer.analyze(raw);
                    scores.details.note =
                        Some(format!("Full NLP backend failed ({e}); basic analysis used"));
                    scores
                }
            },
        }
    }
}

/// Per-language strategies chosen once at process start.
#[derive(Debug, Clone)]
pub struct VerbalAnalyzers {
    en: VerbalAnalyzer,
    fr: VerbalAnalyzer,
}

impl Default for VerbalAnalyzers {
    fn default() -> Self {
        Self::basic()
    }
}

impl VerbalAnalyzers {
    /// Basic strategy for every language.
    pub fn basic() -> Self {
        Self {
            en: VerbalAnalyzer::Basic(BasicAnalyzer),
            fr: VerbalAnalyzer::Basic(BasicAnalyzer),
        }
    }

    /// Try `annotator` on each language and keep the full strategy only
    /// where it answers.
    pub async fn detect(annotator: Option<Arc<dyn Annotator>>) -> Self {
        let Some(annotator) = annotator else {
            log::info!("no NLP backend configured; using basic verbal analysis");
            return Self::basic();
        };

        let mut analyzers = Self::basic();
        for language in [Language::En, Language::Fr] {
            match annotator.check_available(language).await {
                Ok(()) => {
                    log::info!("NLP backend available for '{language}'");
                    *analyzers.slot_mut(language) =
                        VerbalAnalyzer::Full(FullNlpAnalyzer::new(Arc::clone(&annotator)));
                }
                Err(e) => {
                    log::warn!("NLP backend unavailable for '{language}': {e}");
                }
            }
        }
        analyzers
    }

    pub fn for_language(&self, language: Language) -> &VerbalAnalyzer {
        match language {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }

    fn slot_mut(&mut self, language: Language) -> &mut VerbalAnalyzer {
        match language {
            Language::En => &mut self.en,
            Language::Fr => &mut self.fr,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::nlp::tests::{token, FixedAnnotator};
    use crate::analysis::nlp::AnnotatedSentence;
    use crate::analysis::quality_gate::{PenaltyFactors, QualityGate};
    use proptest::prelude::*;

    const PARAGRAPH: &str = "Last summer I travelled to Lisbon with my sister. \
        We walked along the river every evening and tasted wonderful pastries. \
        The museums were crowded, but the architecture was breathtaking!";

    fn sentence(tokens: &[(&str, &str, &str)]) -> AnnotatedSentence {
        AnnotatedSentence {
            tokens: tokens.iter().map(|(t, p, d)| token(t, p, d)).collect(),
        }
    }

    fn sample_doc() -> AnnotatedDoc {
        AnnotatedDoc {
            sentences: vec![
                sentence(&[
                    ("Cats", "NOUN", "nsubj"),
                    ("chase", "VERB", "ROOT"),
                    ("mice", "NOUN", "dobj"),
                    (".", "PUNCT", "punct"),
                ]),
                sentence(&[
                    ("Dogs", "NOUN", "nsubj"),
                    ("bark", "VERB", "ROOT"),
                    ("loudly", "ADV", "advmod"),
                    ("!", "PUNCT", "punct"),
                ]),
            ],
        }
    }

    #[test]
    fn basic_scores_are_in_range() {
        let s = BasicAnalyzer.analyze(PARAGRAPH);
        for v in [s.fluency, s.vocabulary, s.structure] {
            assert!((0.0..=100.0).contains(&v), "{v}");
        }
        assert_eq!(s.details.backend, NlpBackend::Basic);
        assert_eq!(s.details.sentence_count, 3);
        assert!(s.details.note.is_some());
    }

    #[test]
    fn basic_structure_rewards_capitals_and_punctuation() {
        // Varied lengths (+15), all capitalised (+20), punctuation (+15).
        let s = BasicAnalyzer.analyze("Hello there. This is a longer sentence.");
        assert_eq!(s.structure, 100.0);

        let flat = BasicAnalyzer.analyze("hello there friend");
        assert_eq!(flat.structure, 50.0);
    }

    #[test]
    fn fillers_reduce_basic_fluency() {
        // Both sentences fall in the 10..=20 word band.
        let clean = BasicAnalyzer.analyze("I think the new plan works well for everyone in our team.");
        let filled =
            BasicAnalyzer.analyze("Um I think uh the new plan like works well for everyone in our team.");
        assert_eq!(filled.fluency, clean.fluency - 6.0);
    }

    #[test]
    fn basic_vocabulary_of_empty_text_is_base() {
        let s = BasicAnalyzer.analyze("");
        assert_eq!(s.vocabulary, 50.0);
        assert_eq!(s.details.word_count, 0);
    }

    #[test]
    fn full_structure_counts_complete_sentences() {
        let s = FullNlpAnalyzer::score(&sample_doc(), "Cats chase mice. Dogs bark loudly!");
        // 50 + 25 (both complete) + 15 (two distinct patterns) + 10 (both proper).
        assert_eq!(s.structure, 100.0);
        assert_eq!(s.details.backend, NlpBackend::Full);
        assert_eq!(s.details.word_count, 6);
        assert_eq!(s.details.sentence_count, 2);
    }

    #[test]
    fn full_fluency_penalises_short_speech() {
        let s = FullNlpAnalyzer::score(&sample_doc(), "Cats chase mice. Dogs bark loudly!");
        // 50 - 10 (< 50 words); mean length 3 gives no bonus; no repetition.
        assert_eq!(s.fluency, 40.0);
    }

    #[test]
    fn full_vocabulary_without_content_words_is_zero() {
        let doc = AnnotatedDoc {
            sentences: vec![sentence(&[("the", "DET", "det"), (".", "PUNCT", "punct")])],
        };
        assert_eq!(FullNlpAnalyzer::score(&doc, "the.").vocabulary, 0.0);
    }

    #[test]
    fn full_structure_of_empty_doc_is_zero() {
        assert_eq!(FullNlpAnalyzer::score(&AnnotatedDoc::default(), "").structure, 0.0);
    }

    #[test]
    fn penalty_applies_after_clamping() {
        let raw = BasicAnalyzer.analyze(PARAGRAPH);
        let quality = QualityGate::default().assess(PARAGRAPH, 0.3);
        let penalized = raw.clone().penalize(&quality);

        assert_eq!(penalized.fluency, raw.fluency * 0.4);
        assert_eq!(penalized.vocabulary, raw.vocabulary * 0.4);
        assert_eq!(penalized.structure, raw.structure * 0.4);
        assert!(penalized.quality_warning.is_some());
        assert_eq!(penalized.quality_issues, vec![QualityIssue::LowConfidence]);
    }

    #[test]
    fn no_penalty_means_no_warning() {
        let raw = BasicAnalyzer.analyze(PARAGRAPH);
        let quality = QualityGate::default().assess(PARAGRAPH, 0.95);
        let assessed = raw.clone().penalize(&quality);
        assert_eq!(assessed.fluency, raw.fluency);
        assert_eq!(assessed.quality_warning, None);
        assert!(assessed.quality_issues.is_empty());
    }

    #[test]
    fn unpenalised_issues_are_still_reported() {
        let gate = QualityGate::new(PenaltyFactors {
            severe: 0.4,
            medium: 0.7,
            minor: 1.0,
        });
        let quality = gate.assess("Bonjour", 0.95);
        let assessed = BasicAnalyzer.analyze("Bonjour").penalize(&quality);

        assert_eq!(assessed.penalty_factor, 1.0);
        assert_eq!(assessed.quality_warning, None);
        assert_eq!(assessed.quality_issues, vec![QualityIssue::TooShort]);
    }

    #[tokio::test]
    async fn detect_without_annotator_is_basic() {
        let analyzers = VerbalAnalyzers::detect(None).await;
        assert_eq!(analyzers.for_language(Language::En).backend(), NlpBackend::Basic);
        assert_eq!(analyzers.for_language(Language::Fr).backend(), NlpBackend::Basic);
    }

    #[tokio::test]
    async fn detect_with_working_annotator_is_full() {
        let annotator: Arc<dyn Annotator> = Arc::new(FixedAnnotator(Some(sample_doc())));
        let analyzers = VerbalAnalyzers::detect(Some(annotator)).await;
        assert_eq!(analyzers.for_language(Language::En).backend(), NlpBackend::Full);
        assert_eq!(analyzers.for_language(Language::Fr).backend(), NlpBackend::Full);
    }

    #[tokio::test]
    async fn detect_with_failing_annotator_is_basic() {
        let annotator: Arc<dyn Annotator> = Arc::new(FixedAnnotator(None));
        let analyzers = VerbalAnalyzers::detect(Some(annotator)).await;
        assert_eq!(analyzers.for_language(Language::En).backend(), NlpBackend::Basic);
    }

    #[tokio::test]
    async fn runtime_backend_failure_degrades_to_basic() {
        let analyzer =
            VerbalAnalyzer::Full(FullNlpAnalyzer::new(Arc::new(FixedAnnotator(None))));
        let s = analyzer.analyze(PARAGRAPH, Language::En).await;
        assert_eq!(s.details.backend, NlpBackend::Basic);
        assert!(s.details.note.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn full_strategy_uses_annotations() {
        let analyzer =
            VerbalAnalyzer::Full(FullNlpAnalyzer::new(Arc::new(FixedAnnotator(Some(sample_doc())))));
        let s = analyzer.analyze("Cats chase mice. Dogs bark loudly!", Language::En).await;
        assert_eq!(s.details.backend, NlpBackend::Full);
        assert_eq!(s.structure, 100.0);
    }

    fn in_range(s: &VerbalScores) -> bool {
        [s.fluency, s.vocabulary, s.structure]
            .iter()
            .all(|v| (0.0..=100.0).contains(v))
    }

    fn arb_doc() -> impl Strategy<Value = AnnotatedDoc> {
        let tag = prop::sample::select(vec!["NOUN", "VERB", "ADJ", "ADV", "DET", "PRON", "PUNCT"]);
        let dep = prop::sample::select(vec!["nsubj", "nsubjpass", "ROOT", "dobj", "amod", "punct"]);
        let tok = ("[A-Za-z]{1,10}", tag, dep).prop_map(|(t, p, d)| token(&t, p, d));
        prop::collection::vec(prop::collection::vec(tok, 0..20), 0..12).prop_map(|sentences| {
            AnnotatedDoc {
                sentences: sentences
                    .into_iter()
                    .map(|tokens| AnnotatedSentence { tokens })
                    .collect(),
            }
        })
    }

    proptest! {
        #[test]
        fn basic_scores_stay_in_range(text in any::<String>()) {
            prop_assert!(in_range(&BasicAnalyzer.analyze(&text)));
        }

        #[test]
        fn basic_scores_stay_in_range_for_long_text(word in "[A-Za-z]{1,12}", count in 0usize..5_000) {
            let text = vec![word.as_str(); count].join(" ");
            prop_assert!(in_range(&BasicAnalyzer.analyze(&text)));
        }

        #[test]
        fn full_scores_stay_in_range(doc in arb_doc(), raw in any::<String>()) {
            let s = FullNlpAnalyzer::score(&doc, &raw);
            prop_assert!(in_range(&s));
            prop_assert_eq!(s.details.sentence_count, doc.sentences.len());
        }

        #[test]
        fn penalised_scores_stay_in_range(text in any::<String>(), confidence in 0.0f64..=1.0) {
            let quality = QualityGate::default().assess(&text, confidence);
            let a = BasicAnalyzer.analyze(&text).penalize(&quality);
            for v in [a.fluency, a.vocabulary, a.structure] {
                prop_assert!((0.0..=100.0).contains(&v));
            }
            prop_assert_eq!(a.quality_issues.len(), quality.issues.len());
        }
    }
}
