//! Linguistic annotation backends for the full verbal analyzer.
//!
//! [`Annotator`] turns raw text into sentences of [`AnnotatedToken`]s
//! (part-of-speech, dependency label, lemma, stop/punctuation flags).
//! [`HttpAnnotator`] talks to an annotation service over JSON:
//!
//! ```text
//! POST {endpoint}/annotate   {"text": "...", "language": "en"}
//! → {"sentences": [{"tokens": [{"text": "...", "lemma": "...", "pos": "VERB",
//!                               "dep": "nsubj", "is_stop": false, "is_punct": false}]}]}
//! ```
//!
//! Universal POS tags (`VERB`, `NOUN`, …) and Universal Dependencies labels
//! (`nsubj`, `nsubjpass`, …) are expected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NlpConfig;
use crate::language::Language;

// ---------------------------------------------------------------------------
// NlpError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NlpError {
    /// No endpoint configured.
    #[error("no NLP backend configured")]
    Unavailable,

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("NLP request timed out")]
    Timeout,

    #[error("failed to parse NLP response: {0}")]
    Parse(String),

    /// The backend answered but produced no sentences.
    #[error("NLP backend returned an empty document")]
    EmptyResponse,
}

impl From<reqwest::Error> for NlpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NlpError::Timeout
        } else {
            NlpError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub text: String,
    pub lemma: String,
    /// Universal POS tag.
    pub pos: String,
    /// Dependency label.
    pub dep: String,
    #[serde(default)]
    pub is_stop: bool,
    #[serde(default)]
    pub is_punct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub tokens: Vec<AnnotatedToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDoc {
    pub sentences: Vec<AnnotatedSentence>,
}

impl AnnotatedDoc {
    /// All tokens in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &AnnotatedToken> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }
}

// ---------------------------------------------------------------------------
// Annotator trait
// ---------------------------------------------------------------------------

/// Async linguistic annotator.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(&self, text: &str, language: Language) -> Result<AnnotatedDoc, NlpError>;

    /// Check that `language` is supported by annotating a fixed sentence.
    async fn check_available(&self, language: Language) -> Result<(), NlpError> {
        let sample = match language {
            Language::En => "This is a short test sentence.",
            Language::Fr => "Ceci est une courte phrase de test.",
        };
        let doc = self.annotate(sample, language).await?;
        if doc.tokens().next().is_none() {
            return Err(NlpError::EmptyResponse);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HttpAnnotator
// ---------------------------------------------------------------------------

/// Annotation service client.
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnnotator {
    /// Returns `None` when `config.endpoint` is unset or blank.
    pub fn from_config(config: &NlpConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return None;
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Some(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn annotate(&self, text: &str, language: Language) -> Result<AnnotatedDoc, NlpError> {
        let url = format!("{}/annotate", self.endpoint);
        let body = serde_json::json!({
            "text": text,
            "language": language.code(),
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let doc: AnnotatedDoc = response
            .json()
            .await
            .map_err(|e| NlpError::Parse(e.to_string()))?;

        log::debug!(
            "annotated {} chars ({language}) into {} sentences",
            text.len(),
            doc.sentences.len()
        );
        Ok(doc)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
