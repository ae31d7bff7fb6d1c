//! Audio front end: WAV upload → 16 kHz mono → limits check → acoustic features.
//!
//! # Pipeline
//!
//! ```text
//! WAV bytes → decode_wav_within (hound, header duration) → downmix → resample_linear
//!           → AudioLimits::check → AudioFeatureEngine::extract → AudioFeatures
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voice_eval::audio::{decode_wav, AudioFeatureEngine, DspFeatureEngine};
//!
//! let bytes = std::fs::read("speech.wav").unwrap();
//! let audio = decode_wav(&bytes).unwrap();
//! let features = DspFeatureEngine::default().extract(&audio).unwrap();
//! println!("{} onsets in {:.1}s", features.onset_times.len(), features.duration);
//! ```

pub mod decode;
pub mod features;
pub mod limits;

pub use decode::{
    decode_wav, decode_wav_within, downmix, resample_linear, DecodedAudio, TARGET_SAMPLE_RATE,
};
pub use features::{AudioFeatureEngine, AudioFeatures, DspFeatureEngine};
pub use limits::{AudioError, AudioLimits};
