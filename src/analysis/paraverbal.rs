//! Paraverbal sub-scores: pitch, pace and energy.
//!
//! Each score starts at 50 and is clamped to `[0, 100]`.
//!
//! | Score | Inputs | Rules |
//! |-------|--------|-------|
//! | pitch | voiced pitch samples | std `>50/30/10` Hz → +25/15/5, range `>200/100/50` Hz → +25/15/5 |
//! | pace | onsets / duration | `[3,6]`/s +30, `[2,3)∪(6,8]` +15, else −10; consistency `min(10/(std+0.1), 20)` |
//! | energy | RMS samples | std `>0.02/0.01/0.005` → +25/15/5, mean `[0.05,0.3]` +25, `[0.02,0.05)∪(0.3,0.5]` +10 |

use serde::{Deserialize, Serialize};

use crate::analysis::stats::{clamp_score, mean, std_dev, widen};
use crate::audio::{AudioError, AudioFeatures};

const BASE_SCORE: f64 = 50.0;

/// Paraverbal triad plus branch status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParaverbalScores {
    pub pitch: f64,
    pub pace: f64,
    pub energy: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParaverbalScores {
    /// Zeroed triad recording why the audio branch failed.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            pitch: 0.0,
            pace: 0.0,
            energy: 0.0,
            success: false,
            error: Some(error.to_string()),
        }
    }

    pub fn paraverbal_score(&self) -> f64 {
        (self.pitch + self.pace + self.energy) / 3.0
    }
}

/// Scores [`AudioFeatures`]; no audio is touched here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParaverbalAnalyzer;

impl ParaverbalAnalyzer {
    /// # Errors
    ///
    /// [`AudioError::Extraction`] when the features are unusable (non-finite
    /// or non-positive duration, non-finite samples).
    pub fn analyze(&self, features: &AudioFeatures) -> Result<ParaverbalScores, AudioError> {
        if !features.duration.is_finite() || features.duration <= 0.0 {
            return Err(AudioError::Extraction(format!(
                "invalid duration {}",
                features.duration
            )));
        }
        if !all_finite(&features.pitch_samples)
            || !all_finite(&features.rms_samples)
            || !all_finite(&features.onset_times)
        {
            return Err(AudioError::Extraction("non-finite feature values".into()));
        }

        Ok(ParaverbalScores {
            pitch: clamp_score(Self::pitch(&features.pitch_samples)),
            pace: clamp_score(Self::pace(&features.onset_times, features.duration as f64)),
            energy: clamp_score(Self::energy(&features.rms_samples)),
            success: true,
            error: None,
        })
    }

    fn pitch(samples: &[f32]) -> f64 {
        let voiced: Vec<f64> = samples
            .iter()
            .filter(|p| **p > 0.0)
            .map(|&p| p as f64)
            .collect();

        let mut score = BASE_SCORE;
        if voiced.is_empty() {
            return score;
        }

        let std = std_dev(&voiced);
        score += if std > 50.0 {
            25.0
        } else if std > 30.0 {
            15.0
        } else if std > 10.0 {
            5.0
        } else {
            0.0
        };

        let max = voiced.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = voiced.iter().copied().fold(f64::INFINITY, f64::min);
        let range = max - min;
        score += if range > 200.0 {
            25.0
        } else if range > 100.0 {
            15.0
        } else if range > 50.0 {
            5.0
        } else {
            0.0
        };
        score
    }

    fn pace(onsets: &[f32], duration: f64) -> f64 {
        let mut score = BASE_SCORE;

        let rate = onsets.len() as f64 / duration;
        score += if (3.0..=6.0).contains(&rate) {
            30.0
        } else if (2.0..3.0).contains(&rate) || (rate > 6.0 && rate <= 8.0) {
            15.0
        } else {
            -10.0
        };

        if onsets.len() > 1 {
            let intervals: Vec<f64> = onsets.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
            let consistency = 1.0 / (std_dev(&intervals) + 0.1);
            score += (consistency * 10.0).min(20.0);
        }
        score
    }

    fn energy(rms: &[f32]) -> f64 {
        let rms = widen(rms);
        let mut score = BASE_SCORE;

        let std = std_dev(&rms);
        score += if std > 0.02 {
            25.0
        } else if std > 0.01 {
            15.0
        } else if std > 0.005 {
            5.0
        } else {
            0.0
        };

        let avg = mean(&rms);
        if (0.05..=0.3).contains(&avg) {
            score += 25.0;
        } else if (0.02..0.05).contains(&avg) || (avg > 0.3 && avg <= 0.5) {
            score += 10.0;
        }
        score
    }
}

fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn features(pitch: Vec<f32>, rms: Vec<f32>, onsets: Vec<f32>, duration: f32) -> AudioFeatures {
        AudioFeatures {
            pitch_samples: pitch,
            rms_samples: rms,
            onset_times: onsets,
            duration,
        }
    }

    #[test]
    fn expressive_speech_scores_high() {
        // Pitch spread over 100..=345 Hz, lively RMS, 4 evenly spaced onsets per second.
        let pitch: Vec<f32> = (0..50).map(|i| 100.0 + i as f32 * 5.0).collect();
        let rms: Vec<f32> = (0..50).map(|i| if i % 2 == 0 { 0.05 } else { 0.2 }).collect();
        let onsets: Vec<f32> = (0..20).map(|i| i as f32 * 0.25).collect();

        let s = ParaverbalAnalyzer
            .analyze(&features(pitch, rms, onsets, 5.0))
            .unwrap();
        assert_eq!(s.pitch, 100.0);
        assert_eq!(s.pace, 100.0);
        assert_eq!(s.energy, 100.0);
        assert!(s.success);
    }

    #[test]
    fn monotone_silence_scores_base_or_lower() {
        let s = ParaverbalAnalyzer
            .analyze(&features(vec![0.0; 20], vec![0.0; 20], Vec::new(), 2.0))
            .unwrap();
        assert_eq!(s.pitch, 50.0);
        // No onsets: rate 0 → −10.
        assert_eq!(s.pace, 40.0);
        assert_eq!(s.energy, 50.0);
    }

    #[test]
    fn single_onset_gets_no_consistency_bonus() {
        let s = ParaverbalAnalyzer
            .analyze(&features(Vec::new(), Vec::new(), vec![0.1], 0.25))
            .unwrap();
        // 4 onsets/s band, no intervals.
        assert_eq!(s.pace, 80.0);
    }

    #[test]
    fn zero_duration_is_an_error() {
        let err = ParaverbalAnalyzer
            .analyze(&features(Vec::new(), Vec::new(), Vec::new(), 0.0))
            .unwrap_err();
        assert!(matches!(err, AudioError::Extraction(_)));
    }

    #[test]
    fn nan_samples_are_an_error() {
        let err = ParaverbalAnalyzer
            .analyze(&features(vec![f32::NAN], Vec::new(), Vec::new(), 1.0))
            .unwrap_err();
        assert!(matches!(err, AudioError::Extraction(_)));
    }

    #[test]
    fn failed_triad_is_zeroed() {
        let s = ParaverbalScores::failed(AudioError::Empty);
        assert_eq!(s.paraverbal_score(), 0.0);
        assert!(!s.success);
        assert_eq!(s.error.as_deref(), Some("audio is empty"));
    }

    proptest! {
        #[test]
        fn finite_features_score_in_range(
            pitch in prop::collection::vec(prop_oneof![Just(0.0f32), 50.0f32..500.0], 0..400),
            rms in prop::collection::vec(0.0f32..1.0, 0..400),
            onsets in prop::collection::vec(0.0f32..600.0, 0..400),
            duration in 0.1f32..600.0,
        ) {
            let mut onsets = onsets;
            onsets.sort_by(f32::total_cmp);
            let s = ParaverbalAnalyzer
                .analyze(&features(pitch, rms, onsets, duration))
                .unwrap();
            for v in [s.pitch, s.pace, s.energy] {
                prop_assert!((0.0..=100.0).contains(&v));
            }
            prop_assert!(s.success);
        }

        #[test]
        fn analysis_is_deterministic(
            pitch in prop::collection::vec(0.0f32..500.0, 0..100),
            rms in prop::collection::vec(0.0f32..1.0, 0..100),
            duration in 0.1f32..60.0,
        ) {
            let f = features(pitch, rms, Vec::new(), duration);
            prop_assert_eq!(ParaverbalAnalyzer.analyze(&f), ParaverbalAnalyzer.analyze(&f));
        }
    }
}
