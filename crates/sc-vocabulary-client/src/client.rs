//! HTTP client against the community-vocabulary HTTP API, wrapping a
//! TTL+LRU cache and a token-bucket rate limiter.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tracing::debug;

use sc_protocol::VocabularyEntry;
use sc_ws_foundation::backoff::delay_for_attempt;
use sc_ws_foundation::BackoffConfig;

use crate::cache::{VocabularyCache, VocabularyCacheConfig};
use crate::error::VocabularyClientError;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Clone)]
pub struct VocabularyClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub rate_wait_ceiling: Duration,
    pub cache: VocabularyCacheConfig,
    pub retry_backoff: BackoffConfig,
}

impl Default for VocabularyClientConfig {
    fn default() -> Self {
        VocabularyClientConfig {
            base_url: "http://localhost:7175".to_string(),
            request_timeout: Duration::from_secs(10),
            rate_limit: 100,
            rate_window: Duration::from_secs(60),
            rate_wait_ceiling: Duration::from_secs(5),
            cache: VocabularyCacheConfig::default(),
            retry_backoff: BackoffConfig { base_secs: 1, cap_secs: 10, max_attempts: 3 },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntriesEnvelope {
    #[serde(default)]
    entries: Vec<VocabularyEntry>,
}

pub struct VocabularyClient {
    http: reqwest::Client,
    cfg: VocabularyClientConfig,
    rate_limiter: DirectRateLimiter,
    cache: VocabularyCache,
}

impl VocabularyClient {
    pub fn new(cfg: VocabularyClientConfig) -> Result<Self, VocabularyClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| VocabularyClientError::Transport(e.to_string()))?;

        let per_request = cfg.rate_window.as_secs_f64() / f64::from(cfg.rate_limit.max(1));
        let quota = Quota::with_period(Duration::from_secs_f64(per_request))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).unwrap()))
            .allow_burst(NonZeroU32::new(cfg.rate_limit.max(1)).unwrap());
        let rate_limiter = RateLimiter::direct(quota);

        let cache = VocabularyCache::new(cfg.cache);

        Ok(VocabularyClient { http, cfg, rate_limiter, cache })
    }

    /// `GET /community/vocabulary/search?q=…&limit=…`, cache-backed.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<VocabularyEntry>, VocabularyClientError> {
        let cache_key = format!("search:{query}:{limit}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }
        let url = format!(
            "{}/community/vocabulary/search?q={}&limit={limit}",
            self.cfg.base_url.trim_end_matches('/'),
            urlencode(query)
        );
        let entries = self.fetch(&url).await?;
        self.cache.insert(cache_key, entries.clone()).await;
        Ok(entries)
    }

    /// `GET /community/vocabulary?type=popular&limit=…`.
    pub async fn popular(&self, limit: u32) -> Result<Vec<VocabularyEntry>, VocabularyClientError> {
        let cache_key = format!("popular:{limit}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }
        let url = format!(
            "{}/community/vocabulary?type=popular&limit={limit}",
            self.cfg.base_url.trim_end_matches('/')
        );
        let entries = self.fetch(&url).await?;
        self.cache.insert(cache_key, entries.clone()).await;
        Ok(entries)
    }

    /// `GET /community/vocabulary?category=…&limit=…`.
    pub async fn by_category(&self, category: &str, limit: u32) -> Result<Vec<VocabularyEntry>, VocabularyClientError> {
        let cache_key = format!("category:{category}:{limit}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }
        let url = format!(
            "{}/community/vocabulary?category={}&limit={limit}",
            self.cfg.base_url.trim_end_matches('/'),
            urlencode(category)
        );
        let entries = self.fetch(&url).await?;
        self.cache.insert(cache_key, entries.clone()).await;
        Ok(entries)
    }

    /// `POST /community/vocabulary`. Not cached; invalidation of the
    /// affected cache keys is left to TTL expiry rather than explicit
    /// write-through invalidation.
    pub async fn submit(
        &self,
        phrase: &str,
        category: &str,
        definition: Option<&str>,
    ) -> Result<(), VocabularyClientError> {
        self.wait_for_rate_limit().await?;
        let url = format!("{}/community/vocabulary", self.cfg.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "phrase": phrase,
            "category": category,
            "definition": definition,
        });
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VocabularyClientError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VocabularyClientError::Http { status: status.as_u16() });
        }
        Ok(())
    }

    async fn wait_for_rate_limit(&self) -> Result<(), VocabularyClientError> {
        match tokio::time::timeout(self.cfg.rate_wait_ceiling, self.rate_limiter.until_ready()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(VocabularyClientError::RateLimited),
        }
    }

    /// Fetch, treating 404 as empty success and retrying 5xx with capped
    /// backoff.
    async fn fetch(&self, url: &str) -> Result<Vec<VocabularyEntry>, VocabularyClientError> {
        self.wait_for_rate_limit().await?;

        let mut attempt = 0u32;
        loop {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| VocabularyClientError::Transport(e.to_string()))?;

            let status = response.status();
            if status.as_u16() == 404 {
                return Ok(Vec::new());
            }
            if status.is_server_error() && attempt < self.cfg.retry_backoff.max_attempts {
                attempt += 1;
                let delay = delay_for_attempt(&self.cfg.retry_backoff, attempt);
                debug!(attempt, status = status.as_u16(), delay_secs = delay.as_secs_f64(), "retrying vocabulary fetch");
                tokio::time::sleep(delay).await;
                continue;
            }
            if !status.is_success() {
                return Err(VocabularyClientError::Http { status: status.as_u16() });
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| VocabularyClientError::MalformedResponse(e.to_string()))?;
            return if body.is_array() {
                serde_json::from_value(body).map_err(|e| VocabularyClientError::MalformedResponse(e.to_string()))
            } else {
                let wrapped: EntriesEnvelope =
                    serde_json::from_value(body).map_err(|e| VocabularyClientError::MalformedResponse(e.to_string()))?;
                Ok(wrapped.entries)
            };
        }
    }

    #[must_use]
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn sweep_cache(&self) {
        self.cache.sweep().await;
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
