//! The built-in evaluator variants.
//!
//! Six evaluators cover the closed [`VerdictKind`] set. Each builds a
//! task-tagged JSON payload from the query/response/context tuple, delegates
//! to a [`ScoringProvider`], and maps the provider's response into the
//! common [`EvaluationVerdict`] envelope without dropping provider fields.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{RagEvalError, Result};
use crate::evaluator::{EvalInput, Evaluator, ensure_response_text};
use crate::scoring::ScoringProvider;
use crate::verdict::{EvaluationVerdict, VerdictKind};

/// Shared provider-call plumbing: deadline enforcement plus envelope mapping.
struct ScoringCall {
    provider: Arc<dyn ScoringProvider>,
    timeout: Duration,
}

impl ScoringCall {
    fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn score(&self, kind: VerdictKind, payload: &Value) -> Result<EvaluationVerdict> {
        debug!(provider = self.provider.name(), %kind, "scoring response");

        let raw = tokio::time::timeout(self.timeout, self.provider.score(payload))
            .await
            .map_err(|_| RagEvalError::ProviderTimeout {
                provider: self.provider.name().to_string(),
                timeout: self.timeout,
            })??;

        EvaluationVerdict::from_provider(kind, raw)
    }
}

/// Scores how much of the response is unsupported by the retrieved context.
///
/// `passed` is derived from the provider score when the provider does not
/// declare it: a response passes when its hallucination score stays at or
/// below the configured threshold.
pub struct HallucinationEvaluator {
    call: ScoringCall,
    threshold: f64,
}

impl HallucinationEvaluator {
    /// Default pass threshold for the hallucination score.
    pub const DEFAULT_THRESHOLD: f64 = 0.5;

    /// Create a hallucination evaluator backed by the given scoring provider.
    pub fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { call: ScoringCall::new(provider, timeout), threshold: Self::DEFAULT_THRESHOLD }
    }

    /// Set the score threshold above which the response fails.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl Evaluator for HallucinationEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::Hallucination
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let payload = json!({
            "task": "hallucination",
            "query": input.query.text,
            "response": input.response.text,
            "context": input.context.texts(),
        });

        let mut verdict = self.call.score(self.kind(), &payload).await?;
        if verdict.passed.is_none() {
            verdict.passed = verdict.score.map(|s| s <= self.threshold);
        }
        Ok(verdict)
    }
}

/// Checks the response against caller-supplied guidelines.
pub struct GuidelineEvaluator {
    call: ScoringCall,
    guidelines: Vec<String>,
}

impl GuidelineEvaluator {
    /// Create a guideline evaluator with the guidelines the response must follow.
    pub fn new(
        provider: Arc<dyn ScoringProvider>,
        timeout: Duration,
        guidelines: Vec<String>,
    ) -> Self {
        Self { call: ScoringCall::new(provider, timeout), guidelines }
    }
}

#[async_trait]
impl Evaluator for GuidelineEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::Guideline
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let payload = json!({
            "task": "guideline",
            "query": input.query.text,
            "response": input.response.text,
            "context": input.context.texts(),
            "guidelines": self.guidelines,
        });

        self.call.score(self.kind(), &payload).await
    }
}

/// Scores whether the response fully addresses the query.
pub struct CompletenessEvaluator {
    call: ScoringCall,
}

impl CompletenessEvaluator {
    /// Create a completeness evaluator backed by the given scoring provider.
    pub fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { call: ScoringCall::new(provider, timeout) }
    }
}

#[async_trait]
impl Evaluator for CompletenessEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::Completeness
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let payload = json!({
            "task": "completeness",
            "query": input.query.text,
            "response": input.response.text,
            "context": input.context.texts(),
        });

        self.call.score(self.kind(), &payload).await
    }
}

/// Scores whether the response avoids unnecessary content.
pub struct ConcisenessEvaluator {
    call: ScoringCall,
}

impl ConcisenessEvaluator {
    /// Create a conciseness evaluator backed by the given scoring provider.
    pub fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { call: ScoringCall::new(provider, timeout) }
    }
}

#[async_trait]
impl Evaluator for ConcisenessEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::Conciseness
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let payload = json!({
            "task": "conciseness",
            "query": input.query.text,
            "response": input.response.text,
            "context": input.context.texts(),
        });

        self.call.score(self.kind(), &payload).await
    }
}

/// Scores harmful or offensive content in the response.
pub struct ToxicityEvaluator {
    call: ScoringCall,
}

impl ToxicityEvaluator {
    /// Create a toxicity evaluator backed by the given scoring provider.
    pub fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { call: ScoringCall::new(provider, timeout) }
    }
}

#[async_trait]
impl Evaluator for ToxicityEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::Toxicity
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let payload = json!({
            "task": "toxicity",
            "response": input.response.text,
        });

        self.call.score(self.kind(), &payload).await
    }
}

/// Scores how relevant the retrieved context is to the query.
///
/// When a task definition is set, it replaces the retrieved context in the
/// payload so the provider judges relevance against that task instead.
pub struct ContextRelevanceEvaluator {
    call: ScoringCall,
    task_definition: Option<String>,
}

impl ContextRelevanceEvaluator {
    /// Create a context-relevance evaluator backed by the given scoring provider.
    pub fn new(provider: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { call: ScoringCall::new(provider, timeout), task_definition: None }
    }

    /// Judge relevance against a task-specific definition instead of the
    /// retrieved context texts.
    pub fn with_task_definition(mut self, task_definition: impl Into<String>) -> Self {
        self.task_definition = Some(task_definition.into());
        self
    }
}

#[async_trait]
impl Evaluator for ContextRelevanceEvaluator {
    fn kind(&self) -> VerdictKind {
        VerdictKind::ContextRelevance
    }

    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict> {
        ensure_response_text(&input)?;

        let context: Value = match &self.task_definition {
            Some(task) => json!(task),
            None => json!(input.context.texts()),
        };

        let payload = json!({
            "task": "context_relevance",
            "query": input.query.text,
            "response": input.response.text,
            "context": context,
        });

        self.call.score(self.kind(), &payload).await
    }
}
