//! The evaluator capability.

use async_trait::async_trait;

use crate::document::{Query, Response, RetrievalResult};
use crate::error::{RagEvalError, Result};
use crate::verdict::{EvaluationVerdict, VerdictKind};

/// The query/response/context tuple handed to every evaluator.
///
/// Borrowed and immutable: evaluators are read-only over shared data, which
/// is what lets the pipeline fan them out concurrently without locking.
#[derive(Debug, Clone, Copy)]
pub struct EvalInput<'a> {
    /// The original query.
    pub query: &'a Query,
    /// The generated response under evaluation.
    pub response: &'a Response,
    /// The retrieved context the response was generated from.
    pub context: &'a RetrievalResult,
}

/// A quality evaluator over a generated response.
///
/// Implementations delegate to a stateless external scoring service and map
/// its response into the common [`EvaluationVerdict`] envelope. New variants
/// implement this trait; there is no structural duck-typing.
///
/// A failing evaluator never aborts its siblings: the pipeline catches the
/// error and records [`VerdictOutcome::Unavailable`](crate::VerdictOutcome)
/// for that kind only.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// The verdict kind this evaluator produces.
    fn kind(&self) -> VerdictKind;

    /// Evaluate the response, producing a verdict of [`kind`](Evaluator::kind).
    async fn evaluate(&self, input: EvalInput<'_>) -> Result<EvaluationVerdict>;
}

/// Reject inputs with an empty response before any provider call is made.
pub(crate) fn ensure_response_text(input: &EvalInput<'_>) -> Result<()> {
    if input.response.text.trim().is_empty() {
        return Err(RagEvalError::InvalidInput(
            "response text must be non-empty for evaluation".to_string(),
        ));
    }
    Ok(())
}
