//! Evaluator: drives one recording through the full scoring pipeline.
//!
//! # Pipeline flow
//!
//! ```text
//! EvaluationRequest
//!   └─▶ decode_wav_within + AudioLimits::check       (MalformedInput)
//!         ├─▶ transcript branch
//!         │     spawn_blocking(stt.transcribe)          (TranscriptionFailure)
//!         │     └─▶ QualityGate::assess
//!         │           └─▶ VerbalAnalyzer + penalty
//!         │                 └─▶ corpus.list_entries → OriginalityChecker
//!         │                                             (Corpus / EmbeddingFailure)
//!         └─▶ audio branch
//!               spawn_blocking(features.extract) → ParaverbalAnalyzer
//!               └─ Err → zeroed triad, recorded in paraverbal_status
//!   join ─▶ SubScores → CefrLevel → feedback → EvaluationResult
//! ```
//!
//! Both branches run concurrently under `tokio::join!`; blocking engines are
//! pushed onto `tokio::task::spawn_blocking` so the runtime never stalls.

use std::sync::{Arc, MutexGuard, PoisonError};

use thiserror::Error;

use crate::analysis::{
    OriginalityChecker, OriginalityReport, ParaverbalAnalyzer, ParaverbalScores, QualityGate,
    VerbalAnalyzers, VerbalAssessment,
};
use crate::audio::{decode_wav_within, AudioError, AudioFeatureEngine, AudioFeatures, AudioLimits, DecodedAudio};
use crate::embed::{CorpusError, EmbedError, Embedder, ReferenceCorpus};
use crate::language::Language;
use crate::scoring::{generate_feedback, CefrLevel, SubScores, TranscriptionQualityNote};
use crate::stt::{SttError, TranscriptEngine};

use super::result::{AudioSummary, EvaluationRequest, EvaluationResult, ParaverbalStatus};
use super::state::{new_shared_record, EvaluationRecord, SharedRecord};

// ---------------------------------------------------------------------------
// EvaluationError
// ---------------------------------------------------------------------------

/// Errors that abort an evaluation.
///
/// Audio-analysis failures are not listed: they degrade the paraverbal
/// scores instead.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Empty, undecodable or out-of-range audio, rejected before any engine
    /// runs.
    #[error("malformed input: {0}")]
    MalformedInput(#[source] AudioError),

    #[error("transcription failed: {0}")]
    TranscriptionFailure(#[from] SttError),

    /// Embedding failed while the corpus had entries to compare against.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(#[from] EmbedError),

    #[error("reference corpus unavailable: {0}")]
    Corpus(#[from] CorpusError),

    /// A worker task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Everything the transcript branch produces.
struct TranscriptOutcome {
    text: String,
    confidence: f64,
    verbal: VerbalAssessment,
    originality: OriginalityReport,
}

/// Everything the audio branch produces.
struct AudioOutcome {
    scores: ParaverbalScores,
    features: Option<AudioFeatures>,
}

/// Scores recordings.
///
/// Collaborators are injected once and shared read-only by every
/// evaluation; one `Evaluator` can serve concurrent requests.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_eval::analysis::VerbalAnalyzers;
/// use voice_eval::audio::DspFeatureEngine;
/// use voice_eval::config::AppConfig;
/// use voice_eval::embed::{ApiEmbedder, JsonCorpus};
/// use voice_eval::language::Language;
/// use voice_eval::pipeline::{EvaluationRequest, Evaluator};
/// use voice_eval::stt::{lazy_whisper, TranscribeParams};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AppConfig::default();
/// let evaluator = Evaluator::new(
///     Arc::new(lazy_whisper("models/ggml-base.bin".into(), TranscribeParams::default())),
///     Arc::new(DspFeatureEngine::default()),
///     VerbalAnalyzers::basic(),
///     Arc::new(ApiEmbedder::from_config(&config.embedding)),
///     Arc::new(JsonCorpus::load(config.corpus_path())?),
/// );
///
/// let audio = std::fs::read("speech.wav")?;
/// let result = evaluator.evaluate(EvaluationRequest::new(audio, Language::En)).await?;
/// println!("{} ({:.1})", result.estimated_level, result.total_score);
/// # Ok(())
/// # }
/// ```
pub struct Evaluator {
    stt: Arc<dyn TranscriptEngine>,
    features: Arc<dyn AudioFeatureEngine>,
    verbal: VerbalAnalyzers,
    originality: OriginalityChecker,
    corpus: Arc<dyn ReferenceCorpus>,
    paraverbal: ParaverbalAnalyzer,
    gate: QualityGate,
    limits: AudioLimits,
}

impl Evaluator {
    /// Create an evaluator with the default quality gate and audio limits.
    pub fn new(
        stt: Arc<dyn TranscriptEngine>,
        features: Arc<dyn AudioFeatureEngine>,
        verbal: VerbalAnalyzers,
        embedder: Arc<dyn Embedder>,
        corpus: Arc<dyn ReferenceCorpus>,
    ) -> Self {
        Self {
            stt,
            features,
            verbal,
            originality: OriginalityChecker::new(embedder),
            corpus,
            paraverbal: ParaverbalAnalyzer,
            gate: QualityGate::default(),
            limits: AudioLimits::default(),
        }
    }

    pub fn with_quality_gate(mut self, gate: QualityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_limits(mut self, limits: AudioLimits) -> Self {
        self.limits = limits;
        self
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Score one recording.
    ///
    /// # Errors
    ///
    /// See [`EvaluationError`].  A failing audio branch is not an error.
    pub async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let EvaluationRequest {
            audio,
            language,
            theme,
        } = request;

        let decoded =
            decode_wav_within(&audio, &self.limits).map_err(EvaluationError::MalformedInput)?;
        self.limits
            .check(&decoded)
            .map_err(EvaluationError::MalformedInput)?;
        let duration_secs = decoded.duration_secs();
        log::debug!("evaluate: {duration_secs:.2}s of '{language}' audio");

        let decoded = Arc::new(decoded);
        let (transcript, audio) = tokio::join!(
            self.transcript_branch(Arc::clone(&decoded), language),
            self.audio_branch(Arc::clone(&decoded)),
        );
        let transcript = transcript?;

        let scores = SubScores {
            fluency: transcript.verbal.fluency,
            vocabulary: transcript.verbal.vocabulary,
            structure: transcript.verbal.structure,
            pitch: audio.scores.pitch,
            pace: audio.scores.pace,
            energy: audio.scores.energy,
            originality: transcript.originality.score,
        }
        .clamped();

        let verbal_score = scores.verbal_score();
        let paraverbal_score = scores.paraverbal_score();
        let total_score = scores.total_score();
        let estimated_level = CefrLevel::classify(total_score, verbal_score);

        let mut feedback = generate_feedback(&scores);
        if let Some(warning) = &transcript.verbal.quality_warning {
            feedback.transcription_quality = Some(TranscriptionQualityNote {
                issues: transcript
                    .verbal
                    .quality_issues
                    .iter()
                    .map(|i| i.tag().to_string())
                    .collect(),
                warning: warning.clone(),
            });
        }

        log::info!(
            "evaluate: level {estimated_level}, total {total_score:.1} \
             (verbal {verbal_score:.1}, paraverbal {paraverbal_score:.1}, originality {:.1})",
            scores.originality
        );

        Ok(EvaluationResult {
            scores,
            verbal_score,
            paraverbal_score,
            total_score,
            estimated_level,
            feedback,
            quality_issues: transcript.verbal.quality_issues,
            quality_warning: transcript.verbal.quality_warning,
            transcription: transcript.text,
            transcription_confidence: transcript.confidence,
            duration_secs,
            language,
            theme,
            verbal_details: transcript.verbal.details,
            paraverbal_status: ParaverbalStatus {
                success: audio.scores.success,
                error: audio.scores.error,
            },
            originality_details: transcript.originality,
            audio_summary: audio.features.as_ref().map(AudioSummary::from_features),
        })
    }

    /// Run [`evaluate`](Self::evaluate) and return the final record.
    pub async fn run(&self, request: EvaluationRequest) -> EvaluationRecord {
        let record = new_shared_record();
        self.run_tracked(request, &record).await;
        let snapshot = lock(&record).clone();
        snapshot
    }

    /// Run [`evaluate`](Self::evaluate), publishing status transitions to
    /// `record` as they happen.
    pub async fn run_tracked(&self, request: EvaluationRequest, record: &SharedRecord) {
        lock(record).start();

        match self.evaluate(request).await {
            Ok(result) => lock(record).complete(result),
            Err(e) => {
                log::error!("evaluation failed: {e}");
                lock(record).fail(e.to_string());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    async fn transcript_branch(
        &self,
        audio: Arc<DecodedAudio>,
        language: Language,
    ) -> Result<TranscriptOutcome, EvaluationError> {
        let stt = Arc::clone(&self.stt);
        let transcript = tokio::task::spawn_blocking(move || stt.transcribe(&audio.samples, language))
            .await
            .map_err(|e| EvaluationError::Internal(format!("transcription task failed: {e}")))??;

        let confidence = match transcript.average_confidence {
            Some(c) if (0.0..=1.0).contains(&c) => f64::from(c),
            Some(c) => return Err(SttError::InvalidConfidence(c).into()),
            None if !self.stt.reports_confidence() => 1.0,
            None => return Err(SttError::MissingConfidence.into()),
        };
        log::debug!(
            "transcript: {} chars, confidence {confidence:.2}",
            transcript.text.chars().count()
        );

        let quality = self.gate.assess(&transcript.text, confidence);
        if quality.is_penalized() {
            log::warn!(
                "transcript quality issues {:?}; verbal scores ×{}",
                quality.issue_tags(),
                quality.penalty_factor
            );
        }

        let verbal = self
            .verbal
            .for_language(language)
            .analyze(&transcript.text, language)
            .await
            .penalize(&quality);

        let references = self.corpus.list_entries(language)?;
        let originality = self
            .originality
            .check(&transcript.text, language, &references)
            .await?;

        Ok(TranscriptOutcome {
            text: transcript.text,
            confidence,
            verbal,
            originality,
        })
    }

    async fn audio_branch(&self, audio: Arc<DecodedAudio>) -> AudioOutcome {
        let engine = Arc::clone(&self.features);
        let extracted = tokio::task::spawn_blocking(move || engine.extract(&audio)).await;

        let features = match extracted {
            Ok(Ok(features)) => features,
            Ok(Err(e)) => return Self::degraded(e.to_string()),
            Err(e) => return Self::degraded(format!("feature task failed: {e}")),
        };

        match self.paraverbal.analyze(&features) {
            Ok(scores) => AudioOutcome {
                scores,
                features: Some(features),
            },
            Err(e) => Self::degraded(e.to_string()),
        }
    }

    fn degraded(error: String) -> AudioOutcome {
        log::warn!("audio analysis failed ({error}); paraverbal scores set to 0");
        AudioOutcome {
            scores: ParaverbalScores::failed(error),
            features: None,
        }
    }
}

fn lock(record: &SharedRecord) -> MutexGuard<'_, EvaluationRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
