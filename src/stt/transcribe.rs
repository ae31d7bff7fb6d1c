//! Transcription parameter types and result types.
//!
//! [`TranscribeParams`] carries the settings that control a single Whisper
//! inference run.  [`TranscriptResult`] is what every
//! [`TranscriptEngine`](super::TranscriptEngine) returns.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        /// Number of beams to maintain in parallel.
        beam_size: i32,
        /// Beam-search patience factor (≥1.0 = standard beam search).
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        // Offline scoring favours accuracy over latency.
        Self::BeamSearch {
            beam_size: 5,
            patience: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Engine-wide Whisper parameters.  The language is chosen per request.
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// Decoding strategy.
    pub strategy: SamplingStrategy,

    /// Number of CPU threads handed to Whisper.  Defaults to
    /// [`optimal_threads()`], capped at 8.
    pub n_threads: i32,

    /// Suppress Whisper's progress output to stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

/// Returns the number of CPU threads to use for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The output of a successful transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Full transcript text, trimmed.
    pub text: String,

    /// Time-aligned segments in playback order.
    pub segments: Vec<Segment>,

    /// Mean of all word confidences in `[0, 1]`.
    ///
    /// `None` only for engines whose
    /// [`reports_confidence`](super::TranscriptEngine::reports_confidence)
    /// is `false`.
    pub average_confidence: Option<f32>,
}

impl TranscriptResult {
    /// Build a result from segments, deriving `text` and
    /// `average_confidence` from them.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<String>()
            .trim()
            .to_string();

        let confidences: Vec<f32> = segments
            .iter()
            .flat_map(|s| s.word_confidences.iter().copied())
            .collect();

        let average_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32
        };

        Self {
            text,
            segments,
            average_confidence: Some(average_confidence.clamp(0.0, 1.0)),
        }
    }
}

/// A single time-aligned text chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text (may include punctuation inserted by the engine).
    pub text: String,
    /// Start time in seconds from the beginning of the audio.
    pub start: f32,
    /// End time in seconds from the beginning of the audio.
    pub end: f32,
    /// Per-token probabilities in `[0, 1]`.
    pub word_confidences: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, conf: &[f32]) -> Segment {
        Segment {
            text: text.into(),
            start: 0.0,
            end: 1.0,
            word_confidences: conf.to_vec(),
        }
    }

    #[test]
    fn from_segments_concatenates_and_trims() {
        let r = TranscriptResult::from_segments(vec![seg(" Hello", &[0.9]), seg(" world. ", &[0.7])]);
        assert_eq!(r.text, "Hello world.");
    }

    #[test]
    fn from_segments_averages_all_words() {
        let r = TranscriptResult::from_segments(vec![seg("a", &[1.0, 0.5]), seg("b", &[0.0])]);
        assert!((r.average_confidence.unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn no_words_means_zero_confidence() {
        let r = TranscriptResult::from_segments(Vec::new());
        assert_eq!(r.text, "");
        assert_eq!(r.average_confidence, Some(0.0));
    }
}
