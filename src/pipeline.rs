//! The build-and-evaluate pipeline orchestrator.
//!
//! [`EvaluationPipeline`] coordinates the full run: retrieve context for a
//! query, generate a response over it, then fan a configurable set of
//! [`Evaluator`]s out over the result and aggregate their verdicts by kind.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_eval::{EvaluationPipeline, ProviderConfig, DocumentStore};
//!
//! let pipeline = EvaluationPipeline::builder()
//!     .config(ProviderConfig::default())
//!     .store(store)
//!     .embedding_provider(embedder)
//!     .completion_provider(model)
//!     .build()?;
//!
//! pipeline.ingest("What I Worked On. Before college...").await?;
//! let report = pipeline.run("What did he do growing up?", 2, &[], &evaluators).await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::ProviderConfig;
use crate::document::{Query, Response, Unit};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagEvalError, Result};
use crate::evaluator::{EvalInput, Evaluator};
use crate::generation::{CompletionProvider, GenerationParams, ResponseGenerator};
use crate::retriever::Retriever;
use crate::store::DocumentStore;
use crate::trace::{TraceScope, TraceSink};
use crate::verdict::{VerdictKind, VerdictOutcome};

/// The stages a pipeline run walks through.
///
/// `Failed` is terminal and reachable from any working stage on an
/// unrecoverable error. Individual evaluator failures are not unrecoverable;
/// they degrade that evaluator's slot while the run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// No run in progress.
    Idle,
    /// Embedding the query and searching the store.
    Retrieving,
    /// Generating the response over the retrieved context.
    Generating,
    /// Running evaluators over the response.
    Evaluating,
    /// The run completed with a full report.
    Done,
    /// The run aborted on an unrecoverable error.
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Generating => "generating",
            PipelineStage::Evaluating => "evaluating",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The result of one pipeline run: the generated response plus one outcome
/// per requested evaluator kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// The generated response.
    pub response: Response,
    /// Verdicts aggregated by kind; degraded evaluators appear as
    /// [`VerdictOutcome::Unavailable`].
    pub verdicts: HashMap<VerdictKind, VerdictOutcome>,
}

/// The build-and-evaluate pipeline.
///
/// Construct one via [`EvaluationPipeline::builder()`]. Runs are independent
/// of each other; the [`DocumentStore`] is the only state carried between
/// them.
pub struct EvaluationPipeline {
    config: ProviderConfig,
    store: Arc<DocumentStore>,
    retriever: Retriever,
    generator: ResponseGenerator,
    trace: Option<Arc<dyn TraceSink>>,
}

impl EvaluationPipeline {
    /// Create a new [`EvaluationPipelineBuilder`].
    pub fn builder() -> EvaluationPipelineBuilder {
        EvaluationPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Return a reference to the document store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Ingest a text unit into the store.
    ///
    /// # Errors
    ///
    /// Propagates [`RagEvalError::EmbeddingFailure`],
    /// [`RagEvalError::ProviderTimeout`], or [`RagEvalError::InvalidInput`]
    /// from [`DocumentStore::ingest`].
    pub async fn ingest(&self, text: &str) -> Result<Unit> {
        self.store.ingest(text).await
    }

    /// Run the pipeline: retrieve → generate → evaluate.
    ///
    /// Retrieval and generation failures are fatal and surface as the error
    /// of this call; the caller never sees a partial response. Evaluators
    /// run concurrently with independent failure isolation: a timeout or
    /// malformed payload in one degrades that kind to
    /// [`VerdictOutcome::Unavailable`] while the others complete.
    ///
    /// The report's verdict keys equal the requested evaluator kinds. When
    /// two evaluators of the same kind are passed, the first completed
    /// verdict for that kind wins.
    ///
    /// # Errors
    ///
    /// - [`RagEvalError::EmptyStore`] if nothing has been ingested.
    /// - [`RagEvalError::InvalidInput`] if `k == 0`.
    /// - [`RagEvalError::EmbeddingFailure`] / [`RagEvalError::ProviderTimeout`]
    ///   if query embedding fails.
    /// - [`RagEvalError::GenerationFailure`] / [`RagEvalError::ProviderTimeout`]
    ///   if generation fails.
    pub async fn run(
        &self,
        query_text: &str,
        k: usize,
        system_instructions: &[String],
        evaluators: &[Arc<dyn Evaluator>],
    ) -> Result<PipelineReport> {
        // The scope's Drop flushes the sink on every exit path below.
        let scope = TraceScope::enter(self.trace.clone(), "pipeline_run");
        let query = Query::new(query_text);

        scope.record("stage", json!({ "stage": PipelineStage::Retrieving.to_string() }));
        let context = self.retriever.retrieve(&query, k).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            scope.record("stage", json!({ "stage": PipelineStage::Failed.to_string() }));
            e
        })?;

        scope.record("stage", json!({ "stage": PipelineStage::Generating.to_string() }));
        let response =
            self.generator.generate(&query, &context, system_instructions).await.map_err(|e| {
                error!(error = %e, "generation failed");
                scope.record("stage", json!({ "stage": PipelineStage::Failed.to_string() }));
                e
            })?;

        scope.record("stage", json!({ "stage": PipelineStage::Evaluating.to_string() }));
        let outcomes = join_all(evaluators.iter().map(|evaluator| {
            let input = EvalInput { query: &query, response: &response, context: &context };
            async move { (evaluator.kind(), evaluator.evaluate(input).await) }
        }))
        .await;

        let mut verdicts: HashMap<VerdictKind, VerdictOutcome> =
            HashMap::with_capacity(outcomes.len());
        for (kind, outcome) in outcomes {
            let outcome = match outcome {
                Ok(verdict) => VerdictOutcome::Verdict { verdict },
                Err(e) => {
                    warn!(%kind, error = %e, "evaluator degraded to unavailable");
                    VerdictOutcome::Unavailable { message: e.to_string() }
                }
            };
            verdicts.entry(kind).or_insert(outcome);
        }

        scope.record("stage", json!({ "stage": PipelineStage::Done.to_string() }));
        info!(
            verdict_count = verdicts.len(),
            unavailable = verdicts.values().filter(|v| v.is_unavailable()).count(),
            "pipeline run completed"
        );

        Ok(PipelineReport { response, verdicts })
    }

    /// Run the pipeline with the configured `top_k`.
    ///
    /// See [`run`](EvaluationPipeline::run).
    pub async fn run_with_defaults(
        &self,
        query_text: &str,
        system_instructions: &[String],
        evaluators: &[Arc<dyn Evaluator>],
    ) -> Result<PipelineReport> {
        self.run(query_text, self.config.top_k, system_instructions, evaluators).await
    }
}

/// Builder for constructing an [`EvaluationPipeline`].
///
/// All fields except `trace_sink` are required. Call
/// [`build()`](EvaluationPipelineBuilder::build) to validate and produce the
/// pipeline.
#[derive(Default)]
pub struct EvaluationPipelineBuilder {
    config: Option<ProviderConfig>,
    store: Option<Arc<DocumentStore>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl EvaluationPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: ProviderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document store. Sharing one store across pipelines carries
    /// its contents between runs.
    pub fn store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedding provider used for query embedding.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the completion provider used for response generation.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Set an optional trace sink, flushed on every run exit path.
    pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Build the [`EvaluationPipeline`], validating that all required fields
    /// are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagEvalError::Config`] if any required field is missing.
    pub fn build(self) -> Result<EvaluationPipeline> {
        let config =
            self.config.ok_or_else(|| RagEvalError::Config("config is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| RagEvalError::Config("store is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagEvalError::Config("embedding_provider is required".to_string()))?;
        let completion_provider = self
            .completion_provider
            .ok_or_else(|| RagEvalError::Config("completion_provider is required".to_string()))?;

        let retriever = Retriever::new(store.clone(), embedding_provider, config.timeout);
        let generator = ResponseGenerator::new(
            completion_provider,
            GenerationParams { model: config.model.clone(), temperature: config.temperature },
            config.timeout,
        );

        Ok(EvaluationPipeline {
            config,
            store,
            retriever,
            generator,
            trace: self.trace_sink,
        })
    }
}
