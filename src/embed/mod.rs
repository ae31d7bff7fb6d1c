//! Sentence embeddings and the reference corpus they are compared against.
//!
//! * [`Embedder`]: async trait implemented by embedding backends.
//! * [`ApiEmbedder`]: OpenAI-compatible `/v1/embeddings` client.
//! * [`ReferenceCorpus`] / [`JsonCorpus`]: read-only reference texts with
//!   precomputed embeddings, plus offline ingestion.
//!
//! ```rust,no_run
//! use voice_eval::config::AppConfig;
//! use voice_eval::embed::{ApiEmbedder, JsonCorpus};
//! use voice_eval::language::Language;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let embedder = ApiEmbedder::from_config(&config.embedding);
//!     let mut corpus = JsonCorpus::load(config.corpus_path()).unwrap();
//!     corpus
//!         .ingest(&embedder, "My favourite holiday was in Crete.", Language::En, None)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod client;
pub mod corpus;

pub use client::{ApiEmbedder, EmbedError, Embedder};
pub use corpus::{CorpusError, JsonCorpus, ReferenceCorpus, ReferenceCorpusEntry};
