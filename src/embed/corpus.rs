//! Reference-text corpus for the originality check.
//!
//! [`JsonCorpus`] persists entries as a JSON array in the platform config
//! directory (see [`AppPaths::corpus_file`](crate::config::AppPaths)):
//!
//! | Platform | Path |
//! |----------|------|
//! | Windows  | `%APPDATA%\voice-eval\reference-corpus.json` |
//! | macOS    | `~/Library/Application Support/voice-eval/reference-corpus.json` |
//! | Linux    | `~/.config/voice-eval/reference-corpus.json` |
//!
//! The corpus is loaded once and shared read-only by every evaluation.
//! [`JsonCorpus::ingest`] is the only write path and is used offline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embed::{EmbedError, Embedder};
use crate::language::Language;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus file {path} is not valid JSON: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    /// Ingested text was blank.
    #[error("cannot ingest an empty text")]
    EmptyText,
}

// ---------------------------------------------------------------------------
// ReferenceCorpusEntry
// ---------------------------------------------------------------------------

/// One reference text with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCorpusEntry {
    pub text: String,
    pub language: Language,
    #[serde(default)]
    pub theme: Option<String>,
    /// Empty when the embedding has not been computed; such entries are
    /// skipped by the originality check.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// ReferenceCorpus trait
// ---------------------------------------------------------------------------

/// Read-only view of the reference corpus.
pub trait ReferenceCorpus: Send + Sync {
    /// All entries in `language`, in storage order.
    fn list_entries(&self, language: Language) -> Result<Vec<ReferenceCorpusEntry>, CorpusError>;
}

impl ReferenceCorpus for Vec<ReferenceCorpusEntry> {
    fn list_entries(&self, language: Language) -> Result<Vec<ReferenceCorpusEntry>, CorpusError> {
        Ok(self.iter().filter(|e| e.language == language).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// JsonCorpus
// ---------------------------------------------------------------------------

/// File-backed corpus.
#[derive(Debug, Clone)]
pub struct JsonCorpus {
    entries: Vec<ReferenceCorpusEntry>,
    path: PathBuf,
}

impl JsonCorpus {
    /// Load the corpus at `path`.  A missing file is an empty corpus.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CorpusError> {
        let path = path.into();
        let entries = Self::load_entries(&path)?;
        log::info!("reference corpus: {} entries from {}", entries.len(), path.display());
        Ok(Self { entries, path })
    }

    fn load_entries(path: &Path) -> Result<Vec<ReferenceCorpusEntry>, CorpusError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| CorpusError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ReferenceCorpusEntry] {
        &self.entries
    }

    /// Embed `text`, append it to the corpus and persist the file.
    ///
    /// The in-memory corpus only keeps the entry once the file write
    /// succeeded.
    pub async fn ingest(
        &mut self,
        embedder: &dyn Embedder,
        text: &str,
        language: Language,
        theme: Option<String>,
    ) -> Result<&ReferenceCorpusEntry, CorpusError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CorpusError::EmptyText);
        }

        let embedding = embedder.embed(text).await?;
        if let Some(expected) = self.dimension() {
            if embedding.len() != expected {
                return Err(EmbedError::DimensionMismatch {
                    expected,
                    got: embedding.len(),
                }
                .into());
            }
        }

        self.entries.push(ReferenceCorpusEntry {
            text: text.to_string(),
            language,
            theme,
            embedding,
        });
        if let Err(e) = self.save() {
            self.entries.pop();
            return Err(e);
        }

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Dimensionality of the stored embeddings, if any are present.
    pub fn dimension(&self) -> Option<usize> {
        self.entries
            .iter()
            .map(|e| e.embedding.len())
            .find(|&len| len > 0)
    }

    fn save(&self) -> Result<(), CorpusError> {
        let io_err = |source| CorpusError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(&self.entries).map_err(|e| CorpusError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, data).map_err(io_err)
    }
}

impl ReferenceCorpus for JsonCorpus {
    fn list_entries(&self, language: Language) -> Result<Vec<ReferenceCorpusEntry>, CorpusError> {
        self.entries.list_entries(language)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
