//! Request and result records of one evaluation.

use serde::{Deserialize, Serialize};

use crate::analysis::stats::{mean, std_dev, widen};
use crate::analysis::{OriginalityReport, QualityIssue, VerbalDetails};
use crate::audio::AudioFeatures;
use crate::language::Language;
use crate::scoring::{CefrLevel, Feedback, SubScores};

/// One recording submitted for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    /// Raw WAV upload.
    pub audio: Vec<u8>,
    pub language: Language,
    pub theme: Option<String>,
}

impl EvaluationRequest {
    pub fn new(audio: Vec<u8>, language: Language) -> Self {
        Self {
            audio,
            language,
            theme: None,
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }
}

/// Outcome of the audio branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParaverbalStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary statistics of the extracted acoustic features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSummary {
    /// Mean pitch over voiced frames, `0.0` when nothing is voiced.
    pub mean_pitch_hz: f64,
    /// Fraction of pitch frames that are voiced.
    pub voiced_ratio: f64,
    pub mean_rms: f64,
    pub rms_std: f64,
    pub onset_count: usize,
    /// Onsets per second.
    pub onset_rate: f64,
}

impl AudioSummary {
    pub fn from_features(features: &AudioFeatures) -> Self {
        let voiced: Vec<f64> = features
            .pitch_samples
            .iter()
            .filter(|p| **p > 0.0)
            .map(|&p| p as f64)
            .collect();
        let voiced_ratio = if features.pitch_samples.is_empty() {
            0.0
        } else {
            voiced.len() as f64 / features.pitch_samples.len() as f64
        };
        let rms = widen(&features.rms_samples);
        let onset_rate = if features.duration > 0.0 {
            features.onset_times.len() as f64 / features.duration as f64
        } else {
            0.0
        };

        Self {
            mean_pitch_hz: mean(&voiced),
            voiced_ratio,
            mean_rms: mean(&rms),
            rms_std: std_dev(&rms),
            onset_count: features.onset_times.len(),
            onset_rate,
        }
    }
}

/// Everything produced by one successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub scores: SubScores,
    pub verbal_score: f64,
    pub paraverbal_score: f64,
    pub total_score: f64,
    pub estimated_level: CefrLevel,
    pub feedback: Feedback,

    /// Every issue the quality gate detected, whether or not it cost points.
    pub quality_issues: Vec<QualityIssue>,
    pub quality_warning: Option<String>,

    pub transcription: String,
    pub transcription_confidence: f64,
    pub duration_secs: f32,
    pub language: Language,
    pub theme: Option<String>,

    pub verbal_details: VerbalDetails,
    pub paraverbal_status: ParaverbalStatus,
    pub originality_details: OriginalityReport,
    /// `None` when the audio branch failed.
    pub audio_summary: Option<AudioSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_features() {
        let features = AudioFeatures {
            pitch_samples: vec![0.0, 100.0, 200.0, 0.0],
            rms_samples: vec![0.1, 0.3],
            onset_times: vec![0.5, 1.0, 1.5],
            duration: 2.0,
        };
        let s = AudioSummary::from_features(&features);
        assert_eq!(s.mean_pitch_hz, 150.0);
        assert_eq!(s.voiced_ratio, 0.5);
        assert!((s.mean_rms - 0.2).abs() < 1e-6);
        assert!((s.rms_std - 0.1).abs() < 1e-6);
        assert_eq!(s.onset_count, 3);
        assert_eq!(s.onset_rate, 1.5);
    }

    #[test]
    fn summary_of_empty_features_is_zeroed() {
        let s = AudioSummary::from_features(&AudioFeatures::default());
        assert_eq!(s.mean_pitch_hz, 0.0);
        assert_eq!(s.voiced_ratio, 0.0);
        assert_eq!(s.onset_rate, 0.0);
    }

    #[test]
    fn request_builder() {
        let req = EvaluationRequest::new(vec![1, 2], Language::Fr).with_theme("voyage");
        assert_eq!(req.language, Language::Fr);
        assert_eq!(req.theme.as_deref(), Some("voyage"));
    }
}
