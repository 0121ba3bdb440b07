//! Data types for stored units, queries, retrieval results, and responses.

use serde::{Deserialize, Serialize};

/// A stored text unit with its vector embedding.
///
/// Units are created by [`DocumentStore::ingest`](crate::DocumentStore::ingest)
/// and are immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Unique identifier, assigned by the store in insertion order.
    pub id: String,
    /// The text content of the unit.
    pub text: String,
    /// The vector embedding for this unit's text.
    pub embedding: Vec<f32>,
}

/// A query issued against the store. Ephemeral, created per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// The query text.
    pub text: String,
    /// The query embedding, computed lazily by the retriever when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Query {
    /// Create a query from text, leaving the embedding to the retriever.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), embedding: None }
    }
}

/// A retrieved [`Unit`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredUnit {
    /// The retrieved unit.
    pub unit: Unit,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}

/// An ordered sequence of retrieval hits, descending by score.
///
/// Invariants: scores are non-increasing, unit ids are unique, and the
/// length never exceeds the `k` passed to
/// [`Retriever::retrieve`](crate::Retriever::retrieve). Score ties resolve
/// to the earlier-ingested unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The retrieval hits, best first.
    pub hits: Vec<ScoredUnit>,
}

impl RetrievalResult {
    /// The texts of the retrieved units, in retrieval order.
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.unit.text.as_str()).collect()
    }

    /// The ids of the retrieved units, in retrieval order.
    pub fn ids(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.unit.id.clone()).collect()
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when no units were retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A generated response. Produced once per query; immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// The generated text.
    pub text: String,
    /// Ids of the units whose text was placed in the prompt, in retrieval order.
    pub source_units: Vec<String>,
}
