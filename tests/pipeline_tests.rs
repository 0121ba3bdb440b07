//! End-to-end pipeline tests with stub providers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use rag_eval::config::ProviderConfig;
use rag_eval::embedding::EmbeddingProvider;
use rag_eval::error::RagEvalError;
use rag_eval::evaluator::Evaluator;
use rag_eval::evaluators::{CompletenessEvaluator, HallucinationEvaluator, ToxicityEvaluator};
use rag_eval::generation::{CompletionProvider, GenerationParams};
use rag_eval::pipeline::EvaluationPipeline;
use rag_eval::scoring::ScoringProvider;
use rag_eval::store::DocumentStore;
use rag_eval::trace::TraceSink;
use rag_eval::verdict::VerdictKind;

const FIXED_RESPONSE: &str = "He wrote short stories and programmed on an IBM 1401.";

/// Maps known texts to fixed vectors; everything else embeds the same.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(entries: &[(&str, [f32; 2])]) -> Self {
        let table =
            entries.iter().map(|(text, v)| (text.to_string(), v.to_vec())).collect();
        Self { table }
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> rag_eval::Result<Vec<f32>> {
        Ok(self.table.get(text).cloned().unwrap_or_else(|| vec![1.0, 1.0]))
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Always returns the fixed response text.
struct FixedCompleter;

#[async_trait]
impl CompletionProvider for FixedCompleter {
    async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> rag_eval::Result<String> {
        Ok(FIXED_RESPONSE.to_string())
    }
}

/// Returns a fixed verdict immediately.
struct StubScorer {
    verdict: Value,
}

#[async_trait]
impl ScoringProvider for StubScorer {
    async fn score(&self, _payload: &Value) -> rag_eval::Result<Value> {
        Ok(self.verdict.clone())
    }
}

/// Never responds within any reasonable deadline.
struct HangingScorer;

#[async_trait]
impl ScoringProvider for HangingScorer {
    async fn score(&self, _payload: &Value) -> rag_eval::Result<Value> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(json!({ "score": 0.0 }))
    }
}

/// Counts record and flush calls for finalization assertions.
#[derive(Default)]
struct CountingSink {
    records: AtomicUsize,
    flushes: AtomicUsize,
}

impl TraceSink for CountingSink {
    fn record(&self, _event: &str, _fields: &Value) {
        self.records.fetch_add(1, Ordering::SeqCst);
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

const DOC_GROWING_UP: &str =
    "What I Worked On. Before college the two main things I worked on, outside of school, \
     were writing and programming. I wrote short stories.";
const DOC_STARTUP: &str =
    "We started a company called Viaweb to put art galleries online. It did not work.";

/// Pipeline seeded with two fixed documents; the query embedding lands
/// nearest the growing-up document.
async fn seeded_pipeline(trace: Option<Arc<dyn TraceSink>>) -> EvaluationPipeline {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TableEmbedder::new(&[
        (DOC_GROWING_UP, [1.0, 0.0]),
        (DOC_STARTUP, [0.0, 1.0]),
        ("What did he do growing up?", [0.9, 0.1]),
    ]));

    let config = ProviderConfig::builder()
        .model("stub-model")
        .top_k(2)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let store = Arc::new(DocumentStore::new(embedder.clone(), config.timeout));

    let mut builder = EvaluationPipeline::builder()
        .config(config)
        .store(store)
        .embedding_provider(embedder)
        .completion_provider(Arc::new(FixedCompleter));
    if let Some(sink) = trace {
        builder = builder.trace_sink(sink);
    }
    let pipeline = builder.build().unwrap();

    pipeline.ingest(DOC_GROWING_UP).await.unwrap();
    pipeline.ingest(DOC_STARTUP).await.unwrap();
    pipeline
}

fn scorer(verdict: Value) -> Arc<StubScorer> {
    Arc::new(StubScorer { verdict })
}

#[tokio::test]
async fn end_to_end_returns_fixed_response_and_exact_verdict_keys() {
    let pipeline = seeded_pipeline(None).await;
    let timeout = pipeline.config().timeout;

    let evaluators: Vec<Arc<dyn Evaluator>> = vec![
        Arc::new(HallucinationEvaluator::new(scorer(json!({ "score": 0.1 })), timeout)),
        Arc::new(CompletenessEvaluator::new(scorer(json!({ "score": 0.9 })), timeout)),
    ];

    let report =
        pipeline.run("What did he do growing up?", 2, &[], &evaluators).await.unwrap();

    assert_eq!(report.response.text, FIXED_RESPONSE);
    // Both units retrieved with k = 2; the closer one ranks first.
    assert_eq!(report.response.source_units, vec!["unit_0", "unit_1"]);

    let keys: HashSet<VerdictKind> = report.verdicts.keys().copied().collect();
    let expected: HashSet<VerdictKind> =
        [VerdictKind::Hallucination, VerdictKind::Completeness].into_iter().collect();
    assert_eq!(keys, expected);
    assert!(report.verdicts.values().all(|v| !v.is_unavailable()));
}

#[tokio::test]
async fn one_timed_out_evaluator_degrades_without_affecting_siblings() {
    let pipeline = seeded_pipeline(None).await;
    let timeout = pipeline.config().timeout;

    let evaluators: Vec<Arc<dyn Evaluator>> = vec![
        Arc::new(HallucinationEvaluator::new(Arc::new(HangingScorer), timeout)),
        Arc::new(CompletenessEvaluator::new(scorer(json!({ "score": 0.9 })), timeout)),
        Arc::new(ToxicityEvaluator::new(scorer(json!({ "score": 0.0 })), timeout)),
    ];

    let report =
        pipeline.run("What did he do growing up?", 2, &[], &evaluators).await.unwrap();

    assert!(report.verdicts[&VerdictKind::Hallucination].is_unavailable());

    let completeness = report.verdicts[&VerdictKind::Completeness].verdict().unwrap();
    assert_eq!(completeness.score, Some(0.9));
    let toxicity = report.verdicts[&VerdictKind::Toxicity].verdict().unwrap();
    assert_eq!(toxicity.score, Some(0.0));
}

#[tokio::test]
async fn run_against_empty_store_fails_outright() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TableEmbedder::new(&[]));
    let config = ProviderConfig::default();
    let store = Arc::new(DocumentStore::new(embedder.clone(), config.timeout));
    let pipeline = EvaluationPipeline::builder()
        .config(config)
        .store(store)
        .embedding_provider(embedder)
        .completion_provider(Arc::new(FixedCompleter))
        .build()
        .unwrap();

    let err = pipeline.run("anything", 2, &[], &[]).await.unwrap_err();

    assert!(matches!(err, RagEvalError::EmptyStore));
}

#[tokio::test]
async fn duplicate_evaluator_kinds_collapse_to_one_entry() {
    let pipeline = seeded_pipeline(None).await;
    let timeout = pipeline.config().timeout;

    let evaluators: Vec<Arc<dyn Evaluator>> = vec![
        Arc::new(CompletenessEvaluator::new(scorer(json!({ "score": 0.9 })), timeout)),
        Arc::new(CompletenessEvaluator::new(scorer(json!({ "score": 0.1 })), timeout)),
    ];

    let report =
        pipeline.run("What did he do growing up?", 2, &[], &evaluators).await.unwrap();

    assert_eq!(report.verdicts.len(), 1);
    assert!(report.verdicts.contains_key(&VerdictKind::Completeness));
}

#[tokio::test]
async fn trace_sink_is_flushed_on_success() {
    let sink = Arc::new(CountingSink::default());
    let pipeline = seeded_pipeline(Some(sink.clone())).await;

    pipeline.run("What did he do growing up?", 2, &[], &[]).await.unwrap();

    assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    assert!(sink.records.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn trace_sink_is_flushed_when_the_run_fails() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TableEmbedder::new(&[]));
    let config = ProviderConfig::default();
    let store = Arc::new(DocumentStore::new(embedder.clone(), config.timeout));
    let sink = Arc::new(CountingSink::default());
    let pipeline = EvaluationPipeline::builder()
        .config(config)
        .store(store)
        .embedding_provider(embedder)
        .completion_provider(Arc::new(FixedCompleter))
        .trace_sink(sink.clone())
        .build()
        .unwrap();

    // Empty store makes retrieval fail; the scope must still flush.
    let err = pipeline.run("anything", 2, &[], &[]).await.unwrap_err();
    assert!(matches!(err, RagEvalError::EmptyStore));

    assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_with_defaults_uses_the_configured_top_k() {
    let pipeline = seeded_pipeline(None).await;

    let report =
        pipeline.run_with_defaults("What did he do growing up?", &[], &[]).await.unwrap();

    // config top_k is 2 and the store holds two units.
    assert_eq!(report.response.source_units.len(), 2);
}
