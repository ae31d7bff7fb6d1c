//! Spoken-language proficiency scoring.
//!
//! A WAV recording goes in; a CEFR level, seven sub-scores, an originality
//! report and narrative feedback come out.  See [`pipeline::Evaluator`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod embed;
pub mod language;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod stt;
