//! Scoring provider trait for external evaluation services.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A stateless external scoring service.
///
/// Each [`Evaluator`](crate::Evaluator) variant delegates to one scoring
/// backend: the evaluator builds a task-tagged JSON payload, the provider
/// returns a structured JSON verdict. Authentication, when needed, is the
/// provider implementation's concern and comes from the caller's
/// environment or configuration.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Score the payload, returning the provider's structured verdict.
    async fn score(&self, payload: &Value) -> Result<Value>;

    /// Provider name, used in error and trace output.
    fn name(&self) -> &str {
        "scoring"
    }
}
