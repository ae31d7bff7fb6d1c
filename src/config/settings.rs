//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::analysis::PenaltyFactors;

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper transcript engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// GGML model file stem inside the models directory (e.g. `"ggml-base"`).
    pub model: String,
    /// Number of CPU threads handed to Whisper.  `None` picks a default
    /// based on available parallelism.
    pub n_threads: Option<i32>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base".into(),
            n_threads: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio decoding and feature extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Minimum recording length in seconds; shorter clips are rejected before
    /// the pipeline starts.
    pub min_recording_secs: f32,
    /// Maximum recording length in seconds.
    pub max_recording_secs: f32,
    /// Analysis frame length in milliseconds for the RMS envelope and pitch
    /// track.
    pub frame_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            min_recording_secs: 0.5,
            max_recording_secs: 600.0,
            frame_ms: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// NlpConfig
// ---------------------------------------------------------------------------

/// Settings for the optional full NLP annotation backend.
///
/// When `endpoint` is `None`, or the startup availability check fails, the verbal analyzer
/// runs in basic (tokenisation-only) mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Base URL of the annotation service, e.g. `http://localhost:8080`.
    pub endpoint: Option<String>,
    /// Maximum seconds to wait for an annotation response.
    pub timeout_secs: u64,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// EmbeddingConfig
// ---------------------------------------------------------------------------

/// Settings for the sentence-embedding endpoint used by the originality check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API (Ollama, OpenAI, vLLM …).
    pub base_url: String,
    /// API key; `None` for local providers.
    pub api_key: Option<String>,
    /// Embedding model identifier.
    pub model: String,
    /// Maximum seconds to wait for an embedding response.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "paraphrase-multilingual-minilm".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// CorpusConfig
// ---------------------------------------------------------------------------

/// Location of the reference-text corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Explicit corpus file.  `None` resolves to
    /// [`AppPaths::corpus_file`].
    pub path: Option<std::path::PathBuf>,
}

// ---------------------------------------------------------------------------
// ScoringConfig
// ---------------------------------------------------------------------------

/// Heuristic constants of the scoring pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Verbal-score multipliers keyed by transcript quality severity.
    pub penalty: PenaltyFactors,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_eval::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transcript engine settings.
    pub stt: SttConfig,
    /// Audio decoding / feature extraction settings.
    pub audio: AudioConfig,
    /// Optional full NLP backend.
    pub nlp: NlpConfig,
    /// Embedding endpoint for the originality check.
    pub embedding: EmbeddingConfig,
    /// Reference corpus location.
    pub corpus: CorpusConfig,
    /// Scoring heuristics.
    pub scoring: ScoringConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolved corpus file: the configured path, or the default location.
    pub fn corpus_path(&self) -> std::path::PathBuf {
        self.corpus
            .path
            .clone()
            .unwrap_or_else(|| AppPaths::new().corpus_file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
