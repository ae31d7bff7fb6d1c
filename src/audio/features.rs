//! Acoustic feature extraction for paraverbal scoring.
//!
//! [`AudioFeatureEngine`] is the seam between the pipeline and whatever DSP
//! backend produces the time series.  [`DspFeatureEngine`] is the built-in
//! implementation:
//!
//! ## Algorithm
//!
//! The clip is split into overlapping frames (`frame_ms`, hop = half a
//! frame).  For every frame:
//!
//! * **RMS**: root-mean-square amplitude.
//! * **Pitch**: normalised autocorrelation over lags covering
//!   `[min_pitch_hz, max_pitch_hz]`; frames below the silence floor or whose
//!   best peak is under `voicing_threshold` are unvoiced (`0.0`).
//! * **Onset strength**: positive frame-to-frame rise of the RMS envelope.
//!
//! Onsets are peaks of the normalised onset-strength curve that dominate a
//! ±3 frame neighbourhood by at least `onset_delta`, at least 3 frames
//! apart.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioError, DecodedAudio};

// ---------------------------------------------------------------------------
// AudioFeatures
// ---------------------------------------------------------------------------

/// Read-only numeric summary of one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Per-frame fundamental frequency in Hz; `0.0` marks unvoiced frames.
    pub pitch_samples: Vec<f32>,
    /// Per-frame RMS amplitude.
    pub rms_samples: Vec<f32>,
    /// Onset timestamps in seconds, ascending.
    pub onset_times: Vec<f32>,
    /// Total clip duration in seconds.
    pub duration: f32,
}

// ---------------------------------------------------------------------------
// AudioFeatureEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for acoustic feature extraction.
pub trait AudioFeatureEngine: Send + Sync {
    fn extract(&self, audio: &DecodedAudio) -> Result<AudioFeatures, AudioError>;
}

// ---------------------------------------------------------------------------
// DspFeatureEngine
// ---------------------------------------------------------------------------

/// Built-in time-domain feature extractor.
#[derive(Debug, Clone)]
pub struct DspFeatureEngine {
    /// Analysis frame length in milliseconds.
    pub frame_ms: u32,
    /// Lowest detectable fundamental in Hz.
    pub min_pitch_hz: f32,
    /// Highest detectable fundamental in Hz.
    pub max_pitch_hz: f32,
    /// Minimum normalised autocorrelation for a frame to count as voiced.
    pub voicing_threshold: f32,
    /// Frames with RMS below this are treated as silence for pitch tracking.
    pub silence_rms: f32,
    /// Peak-picking margin on the normalised onset strength.
    pub onset_delta: f32,
}

impl Default for DspFeatureEngine {
    fn default() -> Self {
        Self {
            frame_ms: 32,
            min_pitch_hz: 60.0,
            max_pitch_hz: 500.0,
            voicing_threshold: 0.3,
            silence_rms: 0.01,
            onset_delta: 0.07,
        }
    }
}

impl DspFeatureEngine {
    /// Engine with a custom frame length and default thresholds.
    pub fn with_frame_ms(frame_ms: u32) -> Self {
        Self {
            frame_ms,
            ..Self::default()
        }
    }

    fn frame_len(&self, sample_rate: u32) -> usize {
        (sample_rate as usize * self.frame_ms as usize / 1000).max(2)
    }

    fn frames<'a>(&self, samples: &'a [f32], frame_len: usize) -> Vec<&'a [f32]> {
        let hop = (frame_len / 2).max(1);
        let mut frames = Vec::new();
        let mut start = 0;
        while start + frame_len <= samples.len() {
            frames.push(&samples[start..start + frame_len]);
            start += hop;
        }
        frames
    }

    fn frame_pitch(&self, frame: &[f32], rms: f32, sample_rate: u32) -> f32 {
        if rms < self.silence_rms {
            return 0.0;
        }

        let sr = sample_rate as f32;
        let min_lag = (sr / self.max_pitch_hz).floor().max(1.0) as usize;
        let max_lag = ((sr / self.min_pitch_hz).ceil() as usize).min(frame.len() - 1);
        if min_lag >= max_lag {
            return 0.0;
        }

        let energy: f32 = frame.iter().map(|s| s * s).sum();
        if energy <= f32::EPSILON {
            return 0.0;
        }

        let mut best_lag = 0;
        let mut best_corr = 0.0_f32;
        for lag in min_lag..=max_lag {
            let corr: f32 = frame[..frame.len() - lag]
                .iter()
                .zip(&frame[lag..])
                .map(|(a, b)| a * b)
                .sum::<f32>()
                / energy;
            if corr > best_corr {
                best_corr = corr;
                best_lag = lag;
            }
        }

        if best_lag == 0 || best_corr < self.voicing_threshold {
            0.0
        } else {
            sr / best_lag as f32
        }
    }

    fn pick_onsets(&self, rms: &[f32], hop_secs: f32) -> Vec<f32> {
        const WINDOW: usize = 3;
        const WAIT: usize = 3;

        let strength: Vec<f32> = std::iter::once(0.0)
            .chain(rms.windows(2).map(|w| (w[1] - w[0]).max(0.0)))
            .collect();

        let peak = strength.iter().copied().fold(0.0_f32, f32::max);
        if peak <= f32::EPSILON {
            return Vec::new();
        }
        let norm: Vec<f32> = strength.iter().map(|s| s / peak).collect();

        let mut onsets = Vec::new();
        let mut last: Option<usize> = None;
        for i in 0..norm.len() {
            let lo = i.saturating_sub(WINDOW);
            let hi = (i + WINDOW + 1).min(norm.len());
            let window = &norm[lo..hi];

            let local_max = window.iter().copied().fold(0.0_f32, f32::max);
            let local_mean = window.iter().sum::<f32>() / window.len() as f32;

            let is_peak = norm[i] > 0.0 && norm[i] >= local_max && norm[i] >= local_mean + self.onset_delta;
            let spaced = last.map_or(true, |l| i - l >= WAIT);

            if is_peak && spaced {
                onsets.push(i as f32 * hop_secs);
                last = Some(i);
            }
        }
        onsets
    }
}

impl AudioFeatureEngine for DspFeatureEngine {
    fn extract(&self, audio: &DecodedAudio) -> Result<AudioFeatures, AudioError> {
        if audio.samples.is_empty() || audio.sample_rate == 0 {
            return Err(AudioError::Empty);
        }

        let frame_len = self.frame_len(audio.sample_rate);
        let frames = self.frames(&audio.samples, frame_len);
        if frames.len() < 2 {
            return Err(AudioError::TooShort {
                min_secs: frame_len as f32 * 1.5 / audio.sample_rate as f32,
                got_secs: audio.duration_secs(),
            });
        }

        let rms_samples: Vec<f32> = frames
            .iter()
            .map(|f| (f.iter().map(|s| s * s).sum::<f32>() / f.len() as f32).sqrt())
            .collect();

        if rms_samples.iter().any(|v| !v.is_finite()) {
            return Err(AudioError::Extraction("non-finite samples in input".into()));
        }

        let pitch_samples: Vec<f32> = frames
            .iter()
            .zip(&rms_samples)
            .map(|(f, &rms)| self.frame_pitch(f, rms, audio.sample_rate))
            .collect();

        let hop_secs = (frame_len / 2).max(1) as f32 / audio.sample_rate as f32;
        let onset_times = self.pick_onsets(&rms_samples, hop_secs);

        log::debug!(
            "features: {} frames, {} voiced, {} onsets",
            rms_samples.len(),
            pitch_samples.iter().filter(|p| **p > 0.0).count(),
            onset_times.len()
        );

        Ok(AudioFeatures {
            pitch_samples,
            rms_samples,
            onset_times,
            duration: audio.duration_secs(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SR: u32 = 16_000;

    fn sine(freq: f32, secs: f32, amp: f32) -> Vec<f32> {
        (0..(secs * SR as f32) as usize)
            .map(|i| amp * (TAU * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// Tone bursts every `period` seconds, each `burst` seconds long.
    fn bursts(period: f32, burst: f32, secs: f32) -> Vec<f32> {
        let tone = sine(220.0, secs, 0.5);
        tone.iter()
            .enumerate()
            .map(|(i, s)| {
                let t = i as f32 / SR as f32;
                if t % period < burst {
                    *s
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn tracks_pitch_of_pure_tone() {
        let audio = DecodedAudio::new(sine(200.0, 1.0, 0.5), SR);
        let f = DspFeatureEngine::default().extract(&audio).unwrap();

        let voiced: Vec<f32> = f.pitch_samples.iter().copied().filter(|p| *p > 0.0).collect();
        assert!(voiced.len() > f.pitch_samples.len() / 2);
        let mean = voiced.iter().sum::<f32>() / voiced.len() as f32;
        assert!((mean - 200.0).abs() < 10.0, "mean pitch {mean}");
    }

    #[test]
    fn rms_of_constant_sine_is_amplitude_over_sqrt2() {
        let audio = DecodedAudio::new(sine(200.0, 1.0, 0.5), SR);
        let f = DspFeatureEngine::default().extract(&audio).unwrap();
        let mean = f.rms_samples.iter().sum::<f32>() / f.rms_samples.len() as f32;
        assert!((mean - 0.3536).abs() < 0.01, "mean rms {mean}");
        assert!((f.duration - 1.0).abs() < 1e-3);
    }

    #[test]
    fn silence_is_unvoiced_without_onsets() {
        let audio = DecodedAudio::new(vec![0.0; SR as usize], SR);
        let f = DspFeatureEngine::default().extract(&audio).unwrap();
        assert!(f.pitch_samples.iter().all(|p| *p == 0.0));
        assert!(f.onset_times.is_empty());
    }

    #[test]
    fn detects_one_onset_per_burst() {
        // 4 bursts per second for 2 seconds.
        let audio = DecodedAudio::new(bursts(0.25, 0.1, 2.0), SR);
        let f = DspFeatureEngine::default().extract(&audio).unwrap();
        assert!(
            (6..=9).contains(&f.onset_times.len()),
            "onsets: {:?}",
            f.onset_times
        );
        assert!(f.onset_times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn clip_shorter_than_two_frames_is_too_short() {
        let audio = DecodedAudio::new(vec![0.1; 600], SR);
        let err = DspFeatureEngine::default().extract(&audio).unwrap_err();
        assert!(matches!(err, AudioError::TooShort { .. }), "{err}");
    }

    #[test]
    fn empty_clip_is_rejected() {
        let audio = DecodedAudio::new(Vec::new(), SR);
        assert_eq!(
            DspFeatureEngine::default().extract(&audio).unwrap_err(),
            AudioError::Empty
        );
    }
}
