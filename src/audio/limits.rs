//! Pre-pipeline audio validation.
//!
//! [`AudioLimits`] rejects recordings that no analyzer could score before any
//! engine is invoked:
//!
//! | Check | Description |
//! |-------|-------------|
//! | Empty | The decoded clip must contain samples |
//! | Duration | Clip must be within `[min_secs, max_secs]` |
//!
//! # Example
//!
//! ```rust
//! use voice_eval::audio::{AudioError, AudioLimits, DecodedAudio};
//!
//! let limits = AudioLimits::new(0.5, 600.0);
//!
//! let audio = DecodedAudio::new(vec![0.1; 8_000], 16_000);
//! assert!(limits.check(&audio).is_ok());
//!
//! let short = DecodedAudio::new(vec![0.1; 100], 16_000);
//! assert!(matches!(limits.check(&short), Err(AudioError::TooShort { .. })));
//! ```

use thiserror::Error;

use crate::audio::DecodedAudio;
use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Decoding, validation and feature-extraction failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    /// The upload contained no bytes or no samples.
    #[error("audio is empty")]
    Empty,

    /// The bytes could not be parsed as a WAV file.
    #[error("could not decode audio: {0}")]
    Decode(String),

    /// Recording is shorter than the configured minimum.
    #[error("recording too short: {got_secs:.2}s (minimum {min_secs:.2}s)")]
    TooShort { min_secs: f32, got_secs: f32 },

    /// Recording is longer than the configured maximum.
    #[error("recording too long: {got_secs:.2}s (maximum {max_secs:.2}s)")]
    TooLong { max_secs: f32, got_secs: f32 },

    /// Feature extraction failed on an otherwise valid clip.
    #[error("feature extraction failed: {0}")]
    Extraction(String),
}

// ---------------------------------------------------------------------------
// AudioLimits
// ---------------------------------------------------------------------------

/// Duration limits applied to every decoded recording.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioLimits {
    /// Minimum allowed duration in seconds.
    pub min_recording_secs: f32,
    /// Maximum allowed duration in seconds.
    pub max_recording_secs: f32,
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

impl AudioLimits {
    pub fn new(min_secs: f32, max_secs: f32) -> Self {
        Self {
            min_recording_secs: min_secs,
            max_recording_secs: max_secs,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.min_recording_secs, config.max_recording_secs)
    }

    /// Reject a clip whose header declares more than `max_recording_secs`,
    /// before its samples are read.
    pub fn check_declared(&self, declared_secs: f32) -> Result<(), AudioError> {
        if declared_secs > self.max_recording_secs {
            return Err(AudioError::TooLong {
                max_secs: self.max_recording_secs,
                got_secs: declared_secs,
            });
        }
        Ok(())
    }

    /// Returns the first violated limit, checked in order empty → too short
    /// → too long.
    pub fn check(&self, audio: &DecodedAudio) -> Result<(), AudioError> {
        if audio.samples.is_empty() {
            return Err(AudioError::Empty);
        }

        let got_secs = audio.duration_secs();

        if got_secs < self.min_recording_secs {
            return Err(AudioError::TooShort {
                min_secs: self.min_recording_secs,
                got_secs,
            });
        }

        if got_secs > self.max_recording_secs {
            return Err(AudioError::TooLong {
                max_secs: self.max_recording_secs,
                got_secs,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
