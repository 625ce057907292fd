//! `/health` + `/status` detail for the RAG service: queries served,
//! failures, and the vocabulary cache's current entry count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sc_rag::RagOrchestrator;
use sc_runtime::health::StatusProvider;
use serde_json::{json, Value};

pub struct RagStatusProvider {
    orchestrator: Arc<RagOrchestrator>,
    queries_served: AtomicU64,
    queries_failed: AtomicU64,
}

impl RagStatusProvider {
    #[must_use]
    pub fn new(orchestrator: Arc<RagOrchestrator>) -> Arc<Self> {
        Arc::new(RagStatusProvider { orchestrator, queries_served: AtomicU64::new(0), queries_failed: AtomicU64::new(0) })
    }

    pub fn record_success(&self) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }
}

impl StatusProvider for RagStatusProvider {
    fn health_extra(&self) -> (bool, Value) {
        (false, json!({"vocabulary_cache_entries": self.orchestrator.vocabulary_cache_entries()}))
    }

    fn status_snapshot(&self) -> Value {
        json!({
            "queries_served": self.queries_served.load(Ordering::Relaxed),
            "queries_failed": self.queries_failed.load(Ordering::Relaxed),
            "vocabulary_cache_entries": self.orchestrator.vocabulary_cache_entries(),
        })
    }
}
