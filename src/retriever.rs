//! Top-k retrieval over the document store using cosine similarity.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::document::{Query, RetrievalResult, ScoredUnit};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagEvalError, Result};
use crate::store::DocumentStore;

/// Retrieves the top-k most similar stored units for a query.
pub struct Retriever {
    store: Arc<DocumentStore>,
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl Retriever {
    /// Create a retriever over the given store.
    ///
    /// `timeout` is the per-call deadline applied to query embedding.
    pub fn new(
        store: Arc<DocumentStore>,
        provider: Arc<dyn EmbeddingProvider>,
        timeout: Duration,
    ) -> Self {
        Self { store, provider, timeout }
    }

    /// Retrieve the `k` most similar units for the query.
    ///
    /// Results are ordered by descending cosine similarity; score ties
    /// resolve to the earlier-ingested unit. Embeds `query.text` when the
    /// query carries no embedding.
    ///
    /// # Errors
    ///
    /// - [`RagEvalError::InvalidInput`] if `k == 0`.
    /// - [`RagEvalError::EmptyStore`] if nothing has been ingested.
    /// - [`RagEvalError::ProviderTimeout`] / [`RagEvalError::EmbeddingFailure`]
    ///   if query embedding fails.
    pub async fn retrieve(&self, query: &Query, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(RagEvalError::InvalidInput("k must be at least 1".to_string()));
        }

        let units = self.store.all().await;
        if units.is_empty() {
            return Err(RagEvalError::EmptyStore);
        }

        let query_embedding = match &query.embedding {
            Some(embedding) => embedding.clone(),
            None => tokio::time::timeout(self.timeout, self.provider.embed(&query.text))
                .await
                .map_err(|_| RagEvalError::ProviderTimeout {
                    provider: "embedding".to_string(),
                    timeout: self.timeout,
                })??,
        };

        // Stable sort over the insertion-ordered snapshot, so equal scores
        // resolve to the earlier-ingested unit.
        let mut hits: Vec<ScoredUnit> = units
            .into_iter()
            .map(|unit| {
                let score = cosine_similarity(&unit.embedding, &query_embedding);
                ScoredUnit { unit, score }
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        debug!(k, hit_count = hits.len(), "retrieval completed");
        Ok(RetrievalResult { hits })
    }
}
