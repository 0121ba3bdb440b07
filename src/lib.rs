//! # rag-eval
//!
//! A retrieval-augmented generation pipeline with pluggable response
//! evaluators.
//!
//! ## Overview
//!
//! The crate coordinates four components and aggregates their results:
//!
//! - [`DocumentStore`] — append-only in-memory store of text units and their
//!   embeddings (delegated to an [`EmbeddingProvider`]).
//! - [`Retriever`] — brute-force cosine top-k search over the store.
//! - [`ResponseGenerator`] — deterministic prompt assembly plus delegation to
//!   a [`CompletionProvider`].
//! - [`Evaluator`] — a closed set of quality evaluators (hallucination,
//!   guideline, completeness, conciseness, toxicity, context relevance), each
//!   delegating to a stateless [`ScoringProvider`].
//!
//! [`EvaluationPipeline::run`] ties them together: retrieve, generate, then
//! fan the evaluators out concurrently and collect a [`PipelineReport`].
//! Retrieval and generation failures are fatal to the run; an individual
//! evaluator failure degrades only that evaluator's slot.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_eval::{
//!     DocumentStore, EvaluationPipeline, Evaluator, HallucinationEvaluator,
//!     ProviderConfig,
//! };
//!
//! let config = ProviderConfig::builder().top_k(2).build()?;
//! let store = Arc::new(DocumentStore::new(embedder.clone(), config.timeout));
//!
//! let pipeline = EvaluationPipeline::builder()
//!     .config(config.clone())
//!     .store(store)
//!     .embedding_provider(embedder)
//!     .completion_provider(model)
//!     .build()?;
//!
//! pipeline.ingest("What I Worked On. Before college...").await?;
//!
//! let evaluators: Vec<Arc<dyn Evaluator>> =
//!     vec![Arc::new(HallucinationEvaluator::new(scorer, config.timeout))];
//! let report = pipeline.run("What did he do growing up?", 2, &[], &evaluators).await?;
//! ```
//!
//! ## Features
//!
//! - `http` — reqwest-backed [`HttpEmbeddingProvider`](http::HttpEmbeddingProvider),
//!   [`HttpCompletionProvider`](http::HttpCompletionProvider), and
//!   [`HttpScoringProvider`](http::HttpScoringProvider).

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod evaluators;
pub mod generation;
#[cfg(feature = "http")]
pub mod http;
pub mod pipeline;
pub mod retriever;
pub mod scoring;
pub mod store;
pub mod trace;
pub mod verdict;

pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use document::{Query, Response, RetrievalResult, ScoredUnit, Unit};
pub use embedding::EmbeddingProvider;
pub use error::{RagEvalError, Result};
pub use evaluator::{EvalInput, Evaluator};
pub use evaluators::{
    CompletenessEvaluator, ConcisenessEvaluator, ContextRelevanceEvaluator, GuidelineEvaluator,
    HallucinationEvaluator, ToxicityEvaluator,
};
pub use generation::{CompletionProvider, GenerationParams, ResponseGenerator};
pub use pipeline::{
    EvaluationPipeline, EvaluationPipelineBuilder, PipelineReport, PipelineStage,
};
pub use retriever::Retriever;
pub use scoring::ScoringProvider;
pub use store::DocumentStore;
pub use trace::{TraceScope, TraceSink, TracingSink};
pub use verdict::{EvaluationVerdict, VerdictKind, VerdictOutcome};
