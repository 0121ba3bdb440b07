//! Scoped tracing with guaranteed finalization.
//!
//! A [`TraceScope`] is acquired at the start of a pipeline run and records
//! stage transitions to a [`TraceSink`]. Its `Drop` impl flushes the sink on
//! every exit path, including retrieval/generation failures and evaluator
//! degradation.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

/// A destination for trace events emitted during a pipeline run.
pub trait TraceSink: Send + Sync {
    /// Record a named event with structured fields.
    fn record(&self, event: &str, fields: &Value);

    /// Flush buffered events. Called once per scope, on every exit path.
    fn flush(&self);
}

/// The default sink: forwards events to the `tracing` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &str, fields: &Value) {
        info!(event, fields = %fields, "trace event");
    }

    fn flush(&self) {
        info!("trace sink flushed");
    }
}

/// A guard over one traced scope.
///
/// Created via [`TraceScope::enter`]; records events while alive and flushes
/// the sink when dropped. A scope with no sink is a no-op.
pub struct TraceScope {
    sink: Option<Arc<dyn TraceSink>>,
    name: &'static str,
}

impl TraceScope {
    /// Enter a named scope, recording the entry event.
    pub fn enter(sink: Option<Arc<dyn TraceSink>>, name: &'static str) -> Self {
        if let Some(sink) = &sink {
            sink.record("enter", &json!({ "scope": name }));
        }
        Self { sink, name }
    }

    /// Record a named event inside this scope.
    pub fn record(&self, event: &str, fields: Value) {
        if let Some(sink) = &self.sink {
            sink.record(event, &fields);
        }
    }
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.record("exit", &json!({ "scope": self.name }));
            sink.flush();
        }
    }
}
