//! Configuration for providers and the evaluation pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagEvalError, Result};

/// Recognized provider and pipeline options.
///
/// Credentials are always supplied by the caller's environment or
/// configuration; no field carries a baked-in secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Provider endpoint URL, for HTTP-backed providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bearer credential for authenticated provider calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name passed to the completion provider.
    pub model: String,
    /// Sampling temperature for generation, in `[0.0, 2.0]`.
    pub temperature: f32,
    /// Default number of units to retrieve per query (`similarity_top_k`).
    pub top_k: usize,
    /// Per-call deadline applied to every external provider call.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            top_k: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    /// Create a new builder for constructing a [`ProviderConfig`].
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`ProviderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Set the provider endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the bearer credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the default number of units retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the per-call provider deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the [`ProviderConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagEvalError::Config`] if:
    /// - `top_k == 0`
    /// - `temperature` is outside `[0.0, 2.0]`
    /// - `timeout` is zero
    pub fn build(self) -> Result<ProviderConfig> {
        if self.config.top_k == 0 {
            return Err(RagEvalError::Config("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.config.temperature) {
            return Err(RagEvalError::Config(format!(
                "temperature ({}) must be within [0.0, 2.0]",
                self.config.temperature
            )));
        }
        if self.config.timeout.is_zero() {
            return Err(RagEvalError::Config("timeout must be non-zero".to_string()));
        }
        Ok(self.config)
    }
}
