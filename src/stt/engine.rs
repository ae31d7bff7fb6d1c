//! Core transcript engine trait and implementations.
//!
//! # Overview
//!
//! [`TranscriptEngine`] is the public interface used by the pipeline.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn TranscriptEngine>`.
//!
//! [`WhisperEngine`] is the production implementation that wraps a
//! `whisper_rs::WhisperContext`.  Construct it with [`WhisperEngine::load`].
//!
//! [`MockTranscriptEngine`] (available under `#[cfg(test)]`) returns a
//! pre-configured response so the pipeline can be tested without a model file.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::language::Language;
use crate::stt::transcribe::{SamplingStrategy, Segment, TranscribeParams, TranscriptResult};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the transcription subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The GGML model file was not found at the given path.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise a `WhisperContext` or `WhisperState`.
    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// An error occurred during the inference pass.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The engine returned text without a confidence although it claims to
    /// report one.
    #[error("transcript engine returned no confidence")]
    MissingConfidence,

    /// The engine broke the `[0, 1]` confidence contract (including NaN).
    #[error("transcript engine returned confidence {0} outside [0, 1]")]
    InvalidConfidence(f32),
}

// ---------------------------------------------------------------------------
// TranscriptEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `audio` is **16 kHz, mono, f32** PCM.
/// - `average_confidence` is in `[0, 1]`, and is `Some` whenever
///   [`reports_confidence`](Self::reports_confidence) returns `true`.
pub trait TranscriptEngine: Send + Sync {
    /// Transcribe `audio` spoken in `language`.
    fn transcribe(&self, audio: &[f32], language: Language) -> Result<TranscriptResult, SttError>;

    /// Whether this engine produces confidences at all.  Engines that return
    /// `false` get the optimistic 1.0 default in the quality gate.
    fn reports_confidence(&self) -> bool {
        true
    }
}

// Compile-time assertion: Box<dyn TranscriptEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptEngine>) {}
};

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production engine that wraps a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every [`transcribe`] call so the
/// engine can be shared across threads without any locking.
///
/// [`transcribe`]: TranscriptEngine::transcribe
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`]: `model_path` does not exist.
    /// - [`SttError::ContextInit`]: whisper-rs failed to load the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }

    fn full_params(&self, language: Language) -> FullParams<'_, '_> {
        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch { beam_size, patience } => {
                WS::BeamSearch { beam_size, patience }
            }
        };

        let mut fp = FullParams::new(ws);
        fp.set_language(Some(language.code()));
        fp.set_n_threads(self.params.n_threads);
        fp.set_translate(false);

        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
            fp.set_print_special(false);
        }
        fp
    }
}

impl TranscriptEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32], language: Language) -> Result<TranscriptResult, SttError> {
        let fp = self.full_params(language);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let wall_start = std::time::Instant::now();

        state
            .full(fp, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut segments: Vec<Segment> = Vec::with_capacity(n_segments.max(0) as usize);

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as f32 / 100.0;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as f32 / 100.0;

            let n_tokens = state
                .full_n_tokens(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            let mut word_confidences = Vec::with_capacity(n_tokens.max(0) as usize);
            for j in 0..n_tokens {
                let token_text = state.full_get_token_text(i, j).unwrap_or_default();
                // Timestamp / control tokens look like `[_BEG_]` or `<|en|>`.
                if token_text.starts_with("[_") || token_text.starts_with("<|") {
                    continue;
                }
                if let Ok(p) = state.full_get_token_prob(i, j) {
                    word_confidences.push(p.clamp(0.0, 1.0));
                }
            }

            segments.push(Segment {
                text,
                start: t0,
                end: t1,
                word_confidences,
            });
        }

        let result = TranscriptResult::from_segments(segments);
        log::debug!(
            "whisper: {} segments, confidence {:?}, {} ms",
            result.segments.len(),
            result.average_confidence,
            wall_start.elapsed().as_millis()
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// MockTranscriptEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without loading any
/// model file.
#[cfg(test)]
pub struct MockTranscriptEngine {
    response: Result<TranscriptResult, SttError>,
    reports_confidence: bool,
}

#[cfg(test)]
impl MockTranscriptEngine {
    /// Always return `text` as a single segment with the given confidence.
    pub fn ok(text: impl Into<String>, confidence: f32) -> Self {
        let text = text.into();
        Self {
            response: Ok(TranscriptResult {
                segments: vec![Segment {
                    text: text.clone(),
                    start: 0.0,
                    end: 1.0,
                    word_confidences: vec![confidence],
                }],
                text,
                average_confidence: Some(confidence),
            }),
            reports_confidence: true,
        }
    }

    /// Return `text` with no confidence at all.
    pub fn without_confidence(text: impl Into<String>, documented: bool) -> Self {
        let text = text.into();
        Self {
            response: Ok(TranscriptResult {
                segments: Vec::new(),
                text,
                average_confidence: None,
            }),
            reports_confidence: !documented,
        }
    }

    /// Always return `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            reports_confidence: true,
        }
    }
}

#[cfg(test)]
impl TranscriptEngine for MockTranscriptEngine {
    fn transcribe(&self, _audio: &[f32], _language: Language) -> Result<TranscriptResult, SttError> {
        self.response.clone()
    }

    fn reports_confidence(&self) -> bool {
        self.reports_confidence
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcribe::optimal_threads;

    #[test]
    fn mock_ok_returns_configured_text() {
        let engine = MockTranscriptEngine::ok("Bonjour à tous.", 0.8);
        let r = engine.transcribe(&[0.0; 16], Language::Fr).unwrap();
        assert_eq!(r.text, "Bonjour à tous.");
        assert_eq!(r.average_confidence, Some(0.8));
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let engine = MockTranscriptEngine::err(SttError::Transcription("boom".into()));
        let err = engine.transcribe(&[0.0; 16], Language::En).unwrap_err();
        assert!(matches!(err, SttError::Transcription(_)));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperEngine::load("/nonexistent/model.bin", TranscribeParams::default());
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn box_dyn_transcript_engine_compiles() {
        let engine: Box<dyn TranscriptEngine> = Box::new(MockTranscriptEngine::ok("ok", 1.0));
        assert!(engine.reports_confidence());
    }

    #[test]
    fn stt_error_display_model_not_found() {
        let e = SttError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }

    #[test]
    fn optimal_threads_is_positive_and_at_most_8() {
        let t = optimal_threads();
        assert!((1..=8).contains(&t));
    }
}
