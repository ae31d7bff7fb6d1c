//! WAV decoding, channel mixing and resampling.
//!
//! Every engine downstream of the decoder expects **16 kHz mono `f32`**.
//! [`decode_wav`] performs all three conversion steps on the raw upload:
//!
//! 1. parse the RIFF/WAVE container with `hound` (integer or float PCM),
//! 2. [`downmix`] interleaved channels to mono,
//! 3. [`resample_linear`] to [`TARGET_SAMPLE_RATE`].

use std::io::Cursor;

use crate::audio::{AudioError, AudioLimits};

/// Sample rate of every [`DecodedAudio`] produced by [`decode_wav`].
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Mono PCM ready for transcription and feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of `samples` in Hz.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap already-decoded samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length of the clip in seconds; `0.0` for a zero sample rate.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a WAV upload into 16 kHz mono `f32`.
///
/// # Errors
///
/// [`AudioError::Empty`] for an empty blob, [`AudioError::Decode`] when the
/// bytes are not a readable WAV file.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, AudioError> {
    decode(bytes, None)
}

/// Like [`decode_wav`], but rejects a file whose header declares more than
/// `limits.max_recording_secs` before any sample is read.
///
/// The decoded clip still needs [`AudioLimits::check`] for the remaining
/// limits.
pub fn decode_wav_within(bytes: &[u8], limits: &AudioLimits) -> Result<DecodedAudio, AudioError> {
    decode(bytes, Some(limits))
}

fn decode(bytes: &[u8], limits: Option<&AudioLimits>) -> Result<DecodedAudio, AudioError> {
    if bytes.is_empty() {
        return Err(AudioError::Empty);
    }

    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(AudioError::Decode(format!(
            "invalid WAV header: {} channels @ {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    if let Some(limits) = limits {
        // `duration()` counts frames, not interleaved samples.
        limits.check_declared(reader.duration() as f32 / spec.sample_rate as f32)?;
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    let mono = downmix(&interleaved, spec.channels);
    let samples = resample_linear(&mono, spec.sample_rate, TARGET_SAMPLE_RATE);

    log::debug!(
        "decoded WAV: {} ch @ {} Hz, {} bit → {} mono samples @ {} Hz",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        samples.len(),
        TARGET_SAMPLE_RATE
    );

    Ok(DecodedAudio::new(samples, TARGET_SAMPLE_RATE))
}

/// Mix interleaved multi-channel audio down to mono by averaging channels.
///
/// A trailing partial frame is dropped.  `channels == 0` yields an empty
/// vector.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Resample `samples` from `source_rate` to `target_rate` by linear
/// interpolation.  Output length is `ceil(len × target / source)`.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source_rate == 0 {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
