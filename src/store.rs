//! Append-only in-memory document store.
//!
//! [`DocumentStore`] owns the ingested [`Unit`]s behind a
//! `tokio::sync::RwLock`. The write lock is held across the embedding call
//! so concurrent ingestion serializes, which keeps unit ids and
//! insertion-order tie-breaking stable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::document::Unit;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagEvalError, Result};

/// An append-only store of text units and their embeddings.
///
/// No deletion or update is supported; the store is the only state carried
/// between pipeline runs.
pub struct DocumentStore {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    units: RwLock<Vec<Unit>>,
}

impl DocumentStore {
    /// Create an empty store backed by the given embedding provider.
    ///
    /// `timeout` is the per-call deadline applied to embedding requests.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout, units: RwLock::new(Vec::new()) }
    }

    /// Ingest a text unit: embed it and append it to the store.
    ///
    /// Assigns a stable id (`unit_<insertion-index>`) and returns a clone of
    /// the stored unit.
    ///
    /// # Errors
    ///
    /// - [`RagEvalError::InvalidInput`] if `text` is empty.
    /// - [`RagEvalError::ProviderTimeout`] if the embedding call exceeds the
    ///   configured deadline.
    /// - [`RagEvalError::EmbeddingFailure`] if the provider errors or returns
    ///   a vector whose length disagrees with its declared dimensionality.
    pub async fn ingest(&self, text: &str) -> Result<Unit> {
        if text.trim().is_empty() {
            return Err(RagEvalError::InvalidInput("cannot ingest empty text".to_string()));
        }

        // Hold the write lock across the embed so concurrent ingestion
        // serializes and ids stay aligned with insertion order.
        let mut units = self.units.write().await;

        let embedding = tokio::time::timeout(self.timeout, self.provider.embed(text))
            .await
            .map_err(|_| RagEvalError::ProviderTimeout {
                provider: "embedding".to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| {
                error!(error = %e, "embedding failed during ingestion");
                e
            })?;

        let expected = self.provider.dimensions();
        if embedding.len() != expected {
            error!(got = embedding.len(), expected, "embedding dimension mismatch");
            return Err(RagEvalError::EmbeddingFailure {
                provider: "embedding".to_string(),
                message: format!(
                    "provider returned {} dimensions, expected {expected}",
                    embedding.len()
                ),
            });
        }

        let unit = Unit {
            id: format!("unit_{}", units.len()),
            text: text.to_string(),
            embedding,
        };
        units.push(unit.clone());

        info!(unit.id = %unit.id, text_len = text.len(), "ingested unit");
        Ok(unit)
    }

    /// Snapshot of all stored units, in insertion order.
    pub async fn all(&self) -> Vec<Unit> {
        self.units.read().await.clone()
    }

    /// Number of stored units.
    pub async fn len(&self) -> usize {
        self.units.read().await.len()
    }

    /// True when nothing has been ingested yet.
    pub async fn is_empty(&self) -> bool {
        self.units.read().await.is_empty()
    }
}
