//! Transcript and acoustic analysis.
//!
//! * [`QualityGate`]: transcript validation and penalty tier.
//! * [`VerbalAnalyzers`]: fluency / vocabulary / structure, full NLP or basic.
//! * [`ParaverbalAnalyzer`]: pitch / pace / energy from [`AudioFeatures`](crate::audio::AudioFeatures).
//! * [`OriginalityChecker`]: embedding similarity against the reference corpus.

pub mod nlp;
pub mod originality;
pub mod paraverbal;
pub mod quality_gate;
pub mod stats;
pub mod text;
pub mod verbal;

pub use nlp::{AnnotatedDoc, AnnotatedSentence, AnnotatedToken, Annotator, HttpAnnotator, NlpError};
pub use originality::{
    cosine_similarity, OriginalityChecker, OriginalityReport, SimilarText, NEUTRAL_ORIGINALITY,
};
pub use paraverbal::{ParaverbalAnalyzer, ParaverbalScores};
pub use quality_gate::{PenaltyFactors, QualityAssessment, QualityGate, QualityIssue};
pub use verbal::{
    BasicAnalyzer, FullNlpAnalyzer, NlpBackend, VerbalAnalyzer, VerbalAnalyzers, VerbalAssessment,
    VerbalDetails, VerbalScores,
};
