//! Originality: similarity of the transcript to the reference corpus.
//!
//! ```text
//! originality = clamp(100 × (1 − 0.7 × max_sim − 0.3 × mean_sim), 0, 100)
//! ```
//!
//! Only corpus entries in the request language that carry an embedding are
//! compared.  With nothing to compare against, the score is the neutral
//! [`NEUTRAL_ORIGINALITY`] and the report says so.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::stats::{clamp_score, mean};
use crate::embed::{EmbedError, Embedder, ReferenceCorpusEntry};
use crate::language::Language;

pub const NEUTRAL_ORIGINALITY: f64 = 75.0;

/// Entries above this similarity are reported back to the speaker.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

const MAX_SIMILAR_TEXTS: usize = 3;
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarText {
    pub theme: String,
    pub similarity: f64,
    pub text_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalityReport {
    pub score: f64,
    pub max_similarity: f64,
    pub mean_similarity: f64,
    /// Number of reference texts compared.
    pub compared: usize,
    /// Top matches above [`SIMILARITY_THRESHOLD`], most similar first.
    pub similar_texts: Vec<SimilarText>,
    /// `true` when `score` is the placeholder for an empty corpus.
    pub neutral_default: bool,
}

impl OriginalityReport {
    fn neutral() -> Self {
        Self {
            score: NEUTRAL_ORIGINALITY,
            max_similarity: 0.0,
            mean_similarity: 0.0,
            compared: 0,
            similar_texts: Vec::new(),
            neutral_default: true,
        }
    }
}

/// Cosine similarity of two equal-length vectors; `0.0` if either has zero
/// norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn preview(text: &str) -> String {
    let mut p: String = text.chars().take(PREVIEW_CHARS).collect();
    p.push_str("...");
    p
}

pub struct OriginalityChecker {
    embedder: Arc<dyn Embedder>,
}

impl OriginalityChecker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// # Errors
    ///
    /// Any embedding failure, including a reference vector whose dimension
    /// differs from the transcript's.  An empty corpus is not an error.
    pub async fn check(
        &self,
        text: &str,
        language: Language,
        corpus: &[ReferenceCorpusEntry],
    ) -> Result<OriginalityReport, EmbedError> {
        let references: Vec<&ReferenceCorpusEntry> = corpus
            .iter()
            .filter(|e| e.language == language && !e.embedding.is_empty())
            .collect();

        if references.is_empty() {
            log::warn!("no '{language}' reference texts; originality defaults to {NEUTRAL_ORIGINALITY}");
            return Ok(OriginalityReport::neutral());
        }

        let query = self.embedder.embed(text).await?;

        let mut similarities = Vec::with_capacity(references.len());
        let mut similar_texts = Vec::new();
        for entry in &references {
            if entry.embedding.len() != query.len() {
                return Err(EmbedError::DimensionMismatch {
                    expected: query.len(),
                    got: entry.embedding.len(),
                });
            }
            let similarity = cosine_similarity(&query, &entry.embedding);
            similarities.push(similarity);

            if similarity > SIMILARITY_THRESHOLD {
                similar_texts.push(SimilarText {
                    theme: entry.theme.clone().unwrap_or_else(|| "Unknown".to_string()),
                    similarity,
                    text_preview: preview(&entry.text),
                });
            }
        }

        similar_texts.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        similar_texts.truncate(MAX_SIMILAR_TEXTS);

        let max_similarity = similarities
            .iter()
            .copied()
            .max_by(f64::total_cmp)
            .unwrap_or(0.0);
        let mean_similarity = mean(&similarities);
        let score = clamp_score(100.0 * (1.0 - max_similarity * 0.7 - mean_similarity * 0.3));

        Ok(OriginalityReport {
            score,
            max_similarity,
            mean_similarity,
            compared: references.len(),
            similar_texts,
            neutral_default: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::client::tests::FixedEmbedder;
    use proptest::prelude::*;

    fn entry(text: &str, language: Language, embedding: Vec<f32>) -> ReferenceCorpusEntry {
        ReferenceCorpusEntry {
            text: text.into(),
            language,
            theme: Some("daily life".into()),
            embedding,
        }
    }

    fn checker(vector: Option<Vec<f32>>) -> OriginalityChecker {
        OriginalityChecker::new(Arc::new(FixedEmbedder(vector)))
    }

    #[test]
    fn cosine_of_known_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_similarity_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn empty_corpus_is_neutral_without_embedding() {
        // A failing embedder proves no embedding call is made.
        let report = checker(None)
            .check("anything", Language::En, &Vec::<ReferenceCorpusEntry>::new())
            .await
            .unwrap();
        assert_eq!(report.score, 75.0);
        assert!(report.neutral_default);
        assert_eq!(report.compared, 0);
    }

    #[tokio::test]
    async fn other_language_entries_are_ignored() {
        let corpus = vec![entry("bonjour", Language::Fr, vec![1.0, 0.0])];
        let report = checker(None).check("hello", Language::En, &corpus).await.unwrap();
        assert!(report.neutral_default);
    }

    #[tokio::test]
    async fn identical_text_scores_zero() {
        let corpus = vec![entry("same", Language::En, vec![1.0, 0.0])];
        let report = checker(Some(vec![1.0, 0.0]))
            .check("same", Language::En, &corpus)
            .await
            .unwrap();
        assert!(report.score.abs() < 1e-9);
        assert_eq!(report.similar_texts.len(), 1);
        assert_eq!(report.similar_texts[0].text_preview, "same...");
    }

    #[tokio::test]
    async fn orthogonal_text_scores_full() {
        let corpus = vec![entry("other", Language::En, vec![0.0, 1.0])];
        let report = checker(Some(vec![1.0, 0.0]))
            .check("mine", Language::En, &corpus)
            .await
            .unwrap();
        assert_eq!(report.score, 100.0);
        assert!(report.similar_texts.is_empty());
        assert!(!report.neutral_default);
    }

    #[tokio::test]
    async fn similar_texts_sorted_and_capped() {
        let corpus: Vec<_> = [0.99_f32, 0.8, 0.95, 0.9, 0.1]
            .iter()
            .map(|&x| entry("ref", Language::En, vec![x, (1.0 - x * x).sqrt()]))
            .collect();
        let report = checker(Some(vec![1.0, 0.0]))
            .check("query", Language::En, &corpus)
            .await
            .unwrap();
        assert_eq!(report.similar_texts.len(), 3);
        assert!(report.similar_texts.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!((report.similar_texts[0].similarity - 0.99).abs() < 1e-4);
        assert_eq!(report.compared, 5);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let corpus = vec![entry("ref", Language::En, vec![1.0, 0.0, 0.0])];
        let err = checker(Some(vec![1.0, 0.0]))
            .check("query", Language::En, &corpus)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::DimensionMismatch { expected: 2, got: 3 }));
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let corpus = vec![entry("ref", Language::En, vec![1.0, 0.0])];
        let err = checker(None).check("query", Language::En, &corpus).await.unwrap_err();
        assert!(matches!(err, EmbedError::Request(_)));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long: String = "é".repeat(150);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
    }

    proptest! {
        #[test]
        fn score_stays_in_range(
            query in proptest::collection::vec(-1.0f32..1.0, 4),
            references in proptest::collection::vec(
                proptest::collection::vec(-1.0f32..1.0, 4),
                1..8,
            ),
        ) {
            let corpus: Vec<_> = references
                .into_iter()
                .map(|e| entry("reference", Language::En, e))
                .collect();
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let report = runtime
                .block_on(checker(Some(query)).check("text", Language::En, &corpus))
                .unwrap();

            prop_assert!((0.0..=100.0).contains(&report.score));
            prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&report.max_similarity));
            prop_assert!(report.mean_similarity <= report.max_similarity + 1e-9);
            prop_assert!(report.similar_texts.len() <= MAX_SIMILAR_TEXTS);
            prop_assert_eq!(report.compared, corpus.len());
        }
    }
}
