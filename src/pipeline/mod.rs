//! Evaluation pipeline.
//!
//! This module wires the transcript engine, feature engine, analyzers and
//! scoring into one [`Evaluator`] and exposes the status record callers poll
//! while an evaluation is running.
//!
//! # Architecture
//!
//! ```text
//! EvaluationRequest (wav bytes, language, theme)
//!        │
//!        ▼
//! Evaluator::evaluate()  ← async
//!        │
//!        ├─ transcript branch ─ TranscriptEngine → QualityGate → VerbalAnalyzer
//!        │                      └─ ReferenceCorpus → OriginalityChecker
//!        │
//!        └─ audio branch ────── AudioFeatureEngine → ParaverbalAnalyzer
//!                │
//!                ▼
//!        SubScores → CefrLevel → Feedback → EvaluationResult
//!
//! SharedRecord (Arc<Mutex<EvaluationRecord>>) ←── updated by Evaluator::run_tracked()
//! ```

pub mod result;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use result::{AudioSummary, EvaluationRequest, EvaluationResult, ParaverbalStatus};
pub use runner::{EvaluationError, Evaluator};
pub use state::{new_shared_record, EvaluationRecord, EvaluationStatus, SharedRecord};
