//! Transcript engine module.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            TranscriptEngine (trait)                  │
//! │                                                      │
//! │   ┌──────────────────┐    ┌──────────────┐           │
//! │   │ LazyTranscriber  │───▶│ WhisperEngine│           │
//! │   │ - load on first  │    │ - ctx        │           │
//! │   │   use, shared    │    │ - params     │           │
//! │   └──────────────────┘    └──────┬───────┘           │
//! │                                  ▼                   │
//! │                    ┌──────────────────────────┐      │
//! │                    │  transcribe()            │      │
//! │                    │  audio → text + segments │      │
//! │                    │        + confidences     │      │
//! │                    └──────────────────────────┘      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_eval::language::Language;
//! use voice_eval::stt::{lazy_whisper, TranscribeParams, TranscriptEngine};
//!
//! let engine = lazy_whisper("models/ggml-base.bin".into(), TranscribeParams::default());
//!
//! // audio: 16 kHz, mono, f32 PCM from the audio module
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! let result = engine.transcribe(&audio, Language::En).unwrap();
//! println!("{} ({:?})", result.text, result.average_confidence);
//! ```

pub mod engine;
pub mod lazy;
pub mod transcribe;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{SttError, TranscriptEngine, WhisperEngine};
pub use lazy::{lazy_whisper, LazyTranscriber};
pub use transcribe::{SamplingStrategy, Segment, TranscribeParams, TranscriptResult};

#[cfg(test)]
pub use engine::MockTranscriptEngine;
