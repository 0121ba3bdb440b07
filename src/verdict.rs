//! Verdict types produced by evaluators.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RagEvalError, Result};

/// The closed set of evaluator variants.
///
/// Each [`Evaluator`](crate::Evaluator) implementation reports exactly one
/// kind, and every verdict it produces carries that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// Content unsupported by the provided context.
    Hallucination,
    /// Adherence to caller-supplied guidelines.
    Guideline,
    /// Whether the response fully addresses the query.
    Completeness,
    /// Whether the response avoids unnecessary content.
    Conciseness,
    /// Harmful or offensive content.
    Toxicity,
    /// Relevance of the retrieved context to the query.
    ContextRelevance,
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerdictKind::Hallucination => "hallucination",
            VerdictKind::Guideline => "guideline",
            VerdictKind::Completeness => "completeness",
            VerdictKind::Conciseness => "conciseness",
            VerdictKind::Toxicity => "toxicity",
            VerdictKind::ContextRelevance => "context_relevance",
        };
        f.write_str(name)
    }
}

/// The structured output of one evaluator for one response.
///
/// Recognized provider fields (`score`, `passed`, `explanation`) are lifted
/// into typed fields; the full provider payload is retained verbatim so
/// variant-specific detail (per-sentence breakdowns, claim lists) is never
/// lost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationVerdict {
    /// The evaluator variant that produced this verdict.
    pub kind: VerdictKind,
    /// Score in `[0.0, 1.0]`, when the provider declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Pass/fail flag, when the provider or evaluator declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    /// Free-text explanation, when the provider supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// The provider's response, passed through unchanged.
    pub payload: Value,
}

impl EvaluationVerdict {
    /// Build a verdict from a provider's JSON response.
    ///
    /// Lifts `score`, `passed`, and `explanation` when present and keeps the
    /// whole value as `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`RagEvalError::EvaluationUnavailable`] if a declared `score`
    /// lies outside `[0.0, 1.0]` — a malformed payload degrades this
    /// evaluator only.
    pub fn from_provider(kind: VerdictKind, payload: Value) -> Result<Self> {
        let score = payload.get("score").and_then(Value::as_f64);
        if let Some(s) = score {
            if !(0.0..=1.0).contains(&s) {
                return Err(RagEvalError::EvaluationUnavailable {
                    kind,
                    message: format!("provider score {s} outside [0.0, 1.0]"),
                });
            }
        }

        let passed = payload.get("passed").and_then(Value::as_bool);
        let explanation =
            payload.get("explanation").and_then(Value::as_str).map(str::to_string);

        Ok(Self { kind, score, passed, explanation, payload })
    }
}

/// The per-evaluator result slot in a pipeline report.
///
/// An evaluator that times out or returns a malformed payload degrades to
/// [`VerdictOutcome::Unavailable`] without affecting its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum VerdictOutcome {
    /// The evaluator produced a verdict.
    Verdict {
        /// The verdict.
        verdict: EvaluationVerdict,
    },
    /// The evaluator could not produce a verdict this run.
    Unavailable {
        /// Why the evaluator failed.
        message: String,
    },
}

impl VerdictOutcome {
    /// The verdict, if this outcome carries one.
    pub fn verdict(&self) -> Option<&EvaluationVerdict> {
        match self {
            VerdictOutcome::Verdict { verdict } => Some(verdict),
            VerdictOutcome::Unavailable { .. } => None,
        }
    }

    /// True when the evaluator failed this run.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, VerdictOutcome::Unavailable { .. })
    }
}
