//! TTL + LRU cache wrapping vocabulary lookups, with positive and negative
//! caching: a miss is cached as an empty list so a repeated lookup for a
//! nonexistent phrase doesn't keep hitting the network.

use std::time::Duration;

use moka::future::Cache;

use sc_protocol::VocabularyEntry;

#[derive(Debug, Clone, Copy)]
pub struct VocabularyCacheConfig {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for VocabularyCacheConfig {
    fn default() -> Self {
        VocabularyCacheConfig { max_entries: 1000, ttl: Duration::from_secs(300) }
    }
}

pub struct VocabularyCache {
    inner: Cache<String, Vec<VocabularyEntry>>,
}

impl VocabularyCache {
    #[must_use]
    pub fn new(cfg: VocabularyCacheConfig) -> Self {
        let inner = Cache::builder().max_capacity(cfg.max_entries).time_to_live(cfg.ttl).build();
        VocabularyCache { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<VocabularyEntry>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, entries: Vec<VocabularyEntry>) {
        self.inner.insert(key, entries).await;
    }

    /// Explicitly drive eviction of expired entries, rather than waiting
    /// for moka's lazy expiration to notice on next access.
    pub async fn sweep(&self) {
        self.inner.run_pending_tasks().await;
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
