//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + reference corpus):
//!   Windows: %APPDATA%\voice-eval\
//!   macOS:   ~/Library/Application Support/voice-eval/
//!   Linux:   ~/.config/voice-eval/
//!
//! Data dir (models):
//!   Windows: %LOCALAPPDATA%\voice-eval\
//!   macOS:   ~/Library/Application Support/voice-eval/
//!   Linux:   ~/.local/share/voice-eval/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `reference-corpus.json`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to `reference-corpus.json`.
    pub corpus_file: PathBuf,
    /// Directory for GGML model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-eval";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let corpus_file = config_dir.join("reference-corpus.json");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            corpus_file,
            models_dir,
        }
    }

    /// Full path of the GGML model named `stem` (without extension).
    pub fn model_file(&self, stem: &str) -> PathBuf {
        self.models_dir.join(format!("{stem}.bin"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
