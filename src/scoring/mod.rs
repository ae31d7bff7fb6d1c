//! Score aggregation, CEFR classification and feedback.

pub mod aggregate;
pub mod feedback;

pub use aggregate::{CefrLevel, SubScores, ORIGINALITY_WEIGHT, PARAVERBAL_WEIGHT, VERBAL_WEIGHT};
pub use feedback::{generate_feedback, Feedback, TranscriptionQualityNote};
