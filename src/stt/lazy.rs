//! Lazily-loaded transcript engine.
//!
//! [`LazyTranscriber`] wraps a [`LazyModel`] holding a [`TranscriptEngine`]:
//! the first `transcribe` call loads the model, later calls reuse it.  The
//! pipeline only ever sees `Arc<dyn TranscriptEngine>`.
//!
//! Whether the engine reports confidences is fixed when the wrapper is built,
//! so it can be answered without loading the model.

use std::path::PathBuf;

use crate::language::Language;
use crate::models::LazyModel;
use crate::stt::engine::{SttError, TranscriptEngine, WhisperEngine};
use crate::stt::transcribe::{TranscribeParams, TranscriptResult};

/// A transcript engine loaded on first use.
pub struct LazyTranscriber<T = WhisperEngine> {
    model: LazyModel<T, SttError>,
    reports_confidence: bool,
}

impl<T> LazyTranscriber<T> {
    /// Wrap `model`, declaring up front whether the loaded engine reports
    /// confidences.
    pub fn new(model: LazyModel<T, SttError>, reports_confidence: bool) -> Self {
        Self {
            model,
            reports_confidence,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    pub fn teardown(&self) {
        self.model.teardown();
    }
}

/// Build a [`LazyTranscriber`] for the GGML model at `model_path`.
///
/// Nothing is read from disk until the first transcription.  Whisper always
/// reports token probabilities.
pub fn lazy_whisper(model_path: PathBuf, params: TranscribeParams) -> LazyTranscriber {
    let model = LazyModel::new("whisper", move || WhisperEngine::load(&model_path, params.clone()));
    LazyTranscriber::new(model, true)
}

impl<T: TranscriptEngine> TranscriptEngine for LazyTranscriber<T> {
    fn transcribe(&self, audio: &[f32], language: Language) -> Result<TranscriptResult, SttError> {
        self.model.get()?.transcribe(audio, language)
    }

    fn reports_confidence(&self) -> bool {
        self.reports_confidence
    }
}
