//! HTTP-backed provider implementations.
//!
//! This module is only available when the `http` feature is enabled. All
//! three providers authenticate with a bearer credential supplied by the
//! caller's configuration or environment; keys are never embedded in code.
//!
//! The JSON shapes here are this crate's own minimal envelopes, not any
//! vendor's wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagEvalError, Result};
use crate::generation::{CompletionProvider, GenerationParams};
use crate::scoring::ScoringProvider;
use crate::verdict::VerdictKind;

/// Environment variable consulted by the `from_env` constructors.
pub const API_KEY_ENV: &str = "RAG_EVAL_API_KEY";

fn require_key(api_key: &str, provider: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(RagEvalError::Config(format!("{provider}: API key must not be empty")));
    }
    Ok(())
}

fn key_from_env(provider: &str) -> Result<String> {
    std::env::var(API_KEY_ENV).map_err(|_| {
        RagEvalError::Config(format!("{provider}: {API_KEY_ENV} environment variable not set"))
    })
}

/// Extract an error detail from a non-success response body, falling back to
/// the raw body text.
async fn error_detail(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── Embedding ───────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an HTTP embedding endpoint.
///
/// POSTs `{ "model": ..., "input": ... }` and expects
/// `{ "embedding": [f32, ...] }`.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingProvider {
    /// Create a provider for the given endpoint, key, model, and
    /// dimensionality.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let api_key = api_key.into();
        require_key(&api_key, "HttpEmbeddingProvider")?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            dimensions,
        })
    }

    /// Create a provider reading the API key from [`API_KEY_ENV`].
    pub fn from_env(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let api_key = key_from_env("HttpEmbeddingProvider")?;
        Self::new(endpoint, api_key, model, dimensions)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(endpoint = %self.endpoint, text_len = text.len(), "embedding text");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: text })
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "embedding request failed");
                RagEvalError::EmbeddingFailure {
                    provider: self.endpoint.clone(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(endpoint = %self.endpoint, %status, "embedding API error");
            return Err(RagEvalError::EmbeddingFailure {
                provider: self.endpoint.clone(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            RagEvalError::EmbeddingFailure {
                provider: self.endpoint.clone(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Completion ──────────────────────────────────────────────────────

/// A [`CompletionProvider`] backed by an HTTP completion endpoint.
///
/// POSTs `{ "model": ..., "prompt": ..., "temperature": ... }` and expects
/// `{ "text": ... }`.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCompletionProvider {
    /// Create a provider for the given endpoint and key.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_key(&api_key, "HttpCompletionProvider")?;
        Ok(Self { client: reqwest::Client::new(), endpoint: endpoint.into(), api_key })
    }

    /// Create a provider reading the API key from [`API_KEY_ENV`].
    pub fn from_env(endpoint: impl Into<String>) -> Result<Self> {
        let api_key = key_from_env("HttpCompletionProvider")?;
        Self::new(endpoint, api_key)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    text: String,
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        debug!(endpoint = %self.endpoint, model = %params.model, "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &params.model,
                prompt,
                temperature: params.temperature,
            })
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "completion request failed");
                RagEvalError::GenerationFailure {
                    provider: self.endpoint.clone(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(endpoint = %self.endpoint, %status, "completion API error");
            return Err(RagEvalError::GenerationFailure {
                provider: self.endpoint.clone(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            RagEvalError::GenerationFailure {
                provider: self.endpoint.clone(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.text)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

// ── Scoring ─────────────────────────────────────────────────────────

/// A [`ScoringProvider`] backed by an HTTP scoring endpoint.
///
/// POSTs the evaluator's payload verbatim and returns the endpoint's JSON
/// verdict unchanged.
pub struct HttpScoringProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    kind: VerdictKind,
}

impl HttpScoringProvider {
    /// Create a provider for the given endpoint, key, and evaluator kind.
    ///
    /// The kind is only used for error context; one scoring endpoint serves
    /// one evaluator variant.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        kind: VerdictKind,
    ) -> Result<Self> {
        let api_key = api_key.into();
        require_key(&api_key, "HttpScoringProvider")?;
        Ok(Self { client: reqwest::Client::new(), endpoint: endpoint.into(), api_key, kind })
    }

    /// Create a provider reading the API key from [`API_KEY_ENV`].
    pub fn from_env(endpoint: impl Into<String>, kind: VerdictKind) -> Result<Self> {
        let api_key = key_from_env("HttpScoringProvider")?;
        Self::new(endpoint, api_key, kind)
    }
}

#[async_trait]
impl ScoringProvider for HttpScoringProvider {
    async fn score(&self, payload: &Value) -> Result<Value> {
        debug!(endpoint = %self.endpoint, kind = %self.kind, "scoring payload");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "scoring request failed");
                RagEvalError::EvaluationUnavailable {
                    kind: self.kind,
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(endpoint = %self.endpoint, %status, "scoring API error");
            return Err(RagEvalError::EvaluationUnavailable {
                kind: self.kind,
                message: format!("API returned {status}: {detail}"),
            });
        }

        response.json().await.map_err(|e| RagEvalError::EvaluationUnavailable {
            kind: self.kind,
            message: format!("failed to parse response: {e}"),
        })
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}
