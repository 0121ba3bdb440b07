//! Response generation over retrieved context.
//!
//! [`ResponseGenerator`] assembles a deterministic prompt from the retrieved
//! context and caller-supplied system instructions, then delegates to a
//! [`CompletionProvider`]. It never retries; retry policy belongs to the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::document::{Query, Response, RetrievalResult};
use crate::error::{RagEvalError, Result};

/// Generation parameters forwarded to the completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A provider that completes a prompt into text.
///
/// Implementations wrap external language-model backends. Calls may be
/// billed and produce non-deterministic text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the prompt into generated text.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Provider name, used in error and trace output.
    fn name(&self) -> &str {
        "completion"
    }
}

/// Generates a [`Response`] for a query from retrieved context.
pub struct ResponseGenerator {
    provider: Arc<dyn CompletionProvider>,
    params: GenerationParams,
    timeout: Duration,
}

impl ResponseGenerator {
    /// Create a generator backed by the given completion provider.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self { provider, params, timeout }
    }

    /// Assemble the prompt: context texts in retrieval order, then system
    /// instructions in order, then the question. Empty context contributes
    /// nothing, so the model falls back to its own knowledge.
    fn build_prompt(
        query: &Query,
        context: &RetrievalResult,
        system_instructions: &[String],
    ) -> String {
        let mut prompt = String::new();

        if !context.is_empty() {
            prompt.push_str("Context:\n");
            for text in context.texts() {
                prompt.push_str(text);
                prompt.push_str("\n\n");
            }
        }

        for instruction in system_instructions {
            prompt.push_str(instruction);
            prompt.push('\n');
        }

        prompt.push_str("Question: ");
        prompt.push_str(&query.text);
        prompt
    }

    /// Generate a response for the query over the given context.
    ///
    /// # Errors
    ///
    /// - [`RagEvalError::ProviderTimeout`] if the provider call exceeds the
    ///   configured deadline.
    /// - [`RagEvalError::GenerationFailure`] on provider error or empty
    ///   output.
    pub async fn generate(
        &self,
        query: &Query,
        context: &RetrievalResult,
        system_instructions: &[String],
    ) -> Result<Response> {
        let prompt = Self::build_prompt(query, context, system_instructions);
        debug!(
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            context_units = context.len(),
            "generating response"
        );

        let text = tokio::time::timeout(self.timeout, self.provider.complete(&prompt, &self.params))
            .await
            .map_err(|_| RagEvalError::ProviderTimeout {
                provider: self.provider.name().to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| {
                error!(provider = self.provider.name(), error = %e, "generation failed");
                e
            })?;

        if text.trim().is_empty() {
            error!(provider = self.provider.name(), "provider returned empty output");
            return Err(RagEvalError::GenerationFailure {
                provider: self.provider.name().to_string(),
                message: "provider returned empty output".to_string(),
            });
        }

        Ok(Response { text, source_units: context.ids() })
    }
}
