//! Property tests for retrieval ordering and store edge cases.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::Mutex;

use rag_eval::document::Query;
use rag_eval::embedding::EmbeddingProvider;
use rag_eval::error::RagEvalError;
use rag_eval::retriever::Retriever;
use rag_eval::store::DocumentStore;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out pre-seeded embeddings in order, one per ingest call.
struct QueueEmbedder {
    dim: usize,
    queue: Mutex<Vec<Vec<f32>>>,
}

impl QueueEmbedder {
    fn new(dim: usize, vectors: Vec<Vec<f32>>) -> Self {
        let mut queue = vectors;
        queue.reverse();
        Self { dim, queue: Mutex::new(queue) }
    }
}

#[async_trait]
impl EmbeddingProvider for QueueEmbedder {
    async fn embed(&self, _text: &str) -> rag_eval::Result<Vec<f32>> {
        let mut queue = self.queue.lock().await;
        queue.pop().ok_or_else(|| RagEvalError::EmbeddingFailure {
            provider: "queue".to_string(),
            message: "queue exhausted".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Build a store and retriever over the given embeddings, one unit each.
async fn seeded_retriever(dim: usize, embeddings: Vec<Vec<f32>>) -> Retriever {
    let count = embeddings.len();
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(QueueEmbedder::new(dim, embeddings));
    let store = Arc::new(DocumentStore::new(provider.clone(), TIMEOUT));
    for i in 0..count {
        store.ingest(&format!("unit text {i}")).await.unwrap();
    }
    Retriever::new(store, provider, TIMEOUT)
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// *For any* non-empty store and `k >= 1`, `retrieve` SHALL return
/// `min(k, store size)` hits ordered by non-increasing score with no
/// duplicate unit ids.
mod prop_retrieve_ordering {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_descending_unique_and_bounded(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (hits, stored) = rt.block_on(async {
                let stored = embeddings.len();
                let retriever = seeded_retriever(DIM, embeddings).await;
                let query = Query { text: "q".to_string(), embedding: Some(query) };
                let result = retriever.retrieve(&query, k).await.unwrap();
                (result.hits, stored)
            });

            prop_assert_eq!(hits.len(), k.min(stored));

            for window in hits.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }

            let ids: HashSet<&str> = hits.iter().map(|h| h.unit.id.as_str()).collect();
            prop_assert_eq!(ids.len(), hits.len());
        }
    }
}

#[tokio::test]
async fn score_ties_resolve_to_earlier_ingested_unit() {
    // Identical embeddings, so every unit scores the same against the query.
    let retriever =
        seeded_retriever(2, vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]]).await;
    let query = Query { text: "q".to_string(), embedding: Some(vec![1.0, 0.0]) };

    let result = retriever.retrieve(&query, 2).await.unwrap();

    assert_eq!(result.hits[0].unit.id, "unit_0");
    assert_eq!(result.hits[1].unit.id, "unit_1");
}

#[tokio::test]
async fn retrieve_on_empty_store_fails_with_empty_store() {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(QueueEmbedder::new(2, Vec::new()));
    let store = Arc::new(DocumentStore::new(provider.clone(), TIMEOUT));
    let retriever = Retriever::new(store, provider, TIMEOUT);

    let query = Query { text: "q".to_string(), embedding: Some(vec![1.0, 0.0]) };
    let err = retriever.retrieve(&query, 3).await.unwrap_err();

    assert!(matches!(err, RagEvalError::EmptyStore));
}

#[tokio::test]
async fn retrieve_with_zero_k_is_rejected() {
    let retriever = seeded_retriever(2, vec![vec![1.0, 0.0]]).await;
    let query = Query { text: "q".to_string(), embedding: Some(vec![1.0, 0.0]) };

    let err = retriever.retrieve(&query, 0).await.unwrap_err();

    assert!(matches!(err, RagEvalError::InvalidInput(_)));
}

#[tokio::test]
async fn retrieve_embeds_query_when_embedding_absent() {
    // One extra vector in the queue serves the query embedding.
    let provider: Arc<dyn EmbeddingProvider> =
        Arc::new(QueueEmbedder::new(2, vec![vec![0.0, 1.0], vec![1.0, 0.0]]));
    let store = Arc::new(DocumentStore::new(provider.clone(), TIMEOUT));
    store.ingest("only unit").await.unwrap();
    let retriever = Retriever::new(store, provider, TIMEOUT);

    let result = retriever.retrieve(&Query::new("q"), 1).await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.hits[0].unit.id, "unit_0");
}
