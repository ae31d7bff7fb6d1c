//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Dispatch the subcommand:
//!    * `evaluate` builds the collaborators from config, scores one WAV file
//!      and prints the [`EvaluationRecord`](voice_eval::pipeline::EvaluationRecord)
//!      as JSON.
//!    * `ingest` embeds one text file and appends it to the reference corpus.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use voice_eval::{
    analysis::{Annotator, HttpAnnotator, QualityGate, VerbalAnalyzers},
    audio::{AudioLimits, DspFeatureEngine},
    config::{AppConfig, AppPaths},
    embed::{ApiEmbedder, JsonCorpus},
    language::Language,
    pipeline::{EvaluationRequest, EvaluationStatus, Evaluator},
    stt::{lazy_whisper, TranscribeParams},
};

#[derive(Parser)]
#[command(name = "voice-eval", version, about = "Score spoken-language recordings")]
struct Cli {
    /// Settings file; defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a WAV recording and print the result as JSON.
    Evaluate {
        wav: PathBuf,
        #[arg(long)]
        language: Language,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Add a reference text to the originality corpus.
    Ingest {
        text: PathBuf,
        #[arg(long)]
        language: Language,
        #[arg(long)]
        theme: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 2. Configuration
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Subcommand
    match cli.command {
        Command::Evaluate {
            wav,
            language,
            theme,
        } => evaluate(&config, wav, language, theme).await,
        Command::Ingest {
            text,
            language,
            theme,
        } => ingest(&config, text, language, theme).await,
    }
}

async fn evaluate(
    config: &AppConfig,
    wav: PathBuf,
    language: Language,
    theme: Option<String>,
) -> Result<()> {
    let audio = std::fs::read(&wav).with_context(|| format!("reading {}", wav.display()))?;

    let model_path = AppPaths::new().model_file(&config.stt.model);
    let mut params = TranscribeParams::default();
    if let Some(n) = config.stt.n_threads {
        params.n_threads = n;
    }
    log::info!("transcript engine: {}", model_path.display());

    let annotator = HttpAnnotator::from_config(&config.nlp).map(|a| Arc::new(a) as Arc<dyn Annotator>);
    let verbal = VerbalAnalyzers::detect(annotator).await;

    let corpus = JsonCorpus::load(config.corpus_path())?;

    let evaluator = Evaluator::new(
        Arc::new(lazy_whisper(model_path, params)),
        Arc::new(DspFeatureEngine::with_frame_ms(config.audio.frame_ms)),
        verbal,
        Arc::new(ApiEmbedder::from_config(&config.embedding)),
        Arc::new(corpus),
    )
    .with_quality_gate(QualityGate::new(config.scoring.penalty))
    .with_limits(AudioLimits::from_config(&config.audio));

    let mut request = EvaluationRequest::new(audio, language);
    request.theme = theme;

    let record = evaluator.run(request).await;
    println!("{}", serde_json::to_string_pretty(&record)?);

    if record.status == EvaluationStatus::Failed {
        bail!(
            "evaluation failed: {}",
            record.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn ingest(
    config: &AppConfig,
    text: PathBuf,
    language: Language,
    theme: Option<String>,
) -> Result<()> {
    let content =
        std::fs::read_to_string(&text).with_context(|| format!("reading {}", text.display()))?;

    let embedder = ApiEmbedder::from_config(&config.embedding);
    let mut corpus = JsonCorpus::load(config.corpus_path())?;
    corpus.ingest(&embedder, &content, language, theme).await?;

    log::info!(
        "reference corpus now holds {} entries ({})",
        corpus.len(),
        corpus.path().display()
    );
    Ok(())
}
