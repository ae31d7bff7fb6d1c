//! Evaluation lifecycle and shared status record.
//!
//! [`EvaluationStatus`] drives the evaluator's state machine.  Callers that
//! poll progress hold a [`SharedRecord`] and read it while the run is in
//! flight.
//!
//! [`SharedRecord`] is a type alias for `Arc<Mutex<EvaluationRecord>>`.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::pipeline::result::EvaluationResult;

// ---------------------------------------------------------------------------
// EvaluationStatus
// ---------------------------------------------------------------------------

/// States of one evaluation.
///
/// ```text
/// Pending ──evaluate──▶ Processing ──ok──▶ Completed
///                                  ──err─▶ Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// Accepted, not yet started.
    #[default]
    Pending,

    /// Transcript and audio branches are running.
    Processing,

    /// A result is available.
    Completed,

    /// The run aborted; `error_message` says why.
    Failed,
}

impl EvaluationStatus {
    /// Returns `true` once the run can no longer change.
    ///
    /// ```
    /// use voice_eval::pipeline::EvaluationStatus;
    ///
    /// assert!(!EvaluationStatus::Pending.is_terminal());
    /// assert!(!EvaluationStatus::Processing.is_terminal());
    /// assert!(EvaluationStatus::Completed.is_terminal());
    /// assert!(EvaluationStatus::Failed.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(self, EvaluationStatus::Completed | EvaluationStatus::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Processing => "processing",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// EvaluationRecord
// ---------------------------------------------------------------------------

/// Status plus outcome of one evaluation.
///
/// `result` is `Some` only when `status == Completed`; `error_message` only
/// when `status == Failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EvaluationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&mut self) {
        self.status = EvaluationStatus::Processing;
        self.result = None;
        self.error_message = None;
    }

    pub(crate) fn complete(&mut self, result: EvaluationResult) {
        self.status = EvaluationStatus::Completed;
        self.result = Some(result);
        self.error_message = None;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = EvaluationStatus::Failed;
        self.result = None;
        self.error_message = Some(message.into());
    }
}

// ---------------------------------------------------------------------------
// SharedRecord
// ---------------------------------------------------------------------------

/// Thread-safe handle to an [`EvaluationRecord`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedRecord = Arc<Mutex<EvaluationRecord>>;

/// Construct a new [`SharedRecord`] in the `Pending` state.
pub fn new_shared_record() -> SharedRecord {
    Arc::new(Mutex::new(EvaluationRecord::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
