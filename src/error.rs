//! Error types for the `rag-eval` crate.

use std::time::Duration;

use thiserror::Error;

use crate::verdict::VerdictKind;

/// Errors that can occur while building and evaluating responses.
#[derive(Debug, Error)]
pub enum RagEvalError {
    /// The embedding provider failed or returned a malformed vector.
    #[error("Embedding failure ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Retrieval was attempted against a store with zero units.
    #[error("Document store is empty")]
    EmptyStore,

    /// The language-model provider failed, timed out, or returned empty output.
    #[error("Generation failure ({provider}): {message}")]
    GenerationFailure {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An input failed validation before any provider call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single evaluator could not produce a verdict. Never fatal to a
    /// pipeline run; the pipeline degrades that evaluator's result instead.
    #[error("Evaluator '{kind}' unavailable: {message}")]
    EvaluationUnavailable {
        /// The evaluator variant that failed.
        kind: VerdictKind,
        /// A description of the failure.
        message: String,
    },

    /// An external provider call exceeded its configured deadline.
    #[error("Provider '{provider}' timed out after {timeout:?}")]
    ProviderTimeout {
        /// The provider that timed out.
        provider: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for rag-eval operations.
pub type Result<T> = std::result::Result<T, RagEvalError>;
