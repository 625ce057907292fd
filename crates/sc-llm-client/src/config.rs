//! Tunables for [`crate::client::LlmClient`]. Built by each service binary
//! from its own `sc_config` section rather than depending on `sc-config`
//! here, keeping this crate usable standalone.

use std::time::Duration;

use sc_ws_foundation::{BackoffConfig, CircuitBreakerConfig};

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub api_url: String,
    pub model: String,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub rate_wait_ceiling: Duration,
    pub request_timeout: Duration,
    pub retry_backoff: BackoffConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        LlmClientConfig {
            api_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            rate_limit: 10,
            rate_window: Duration::from_secs(60),
            rate_wait_ceiling: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry_backoff: BackoffConfig { base_secs: 1, cap_secs: 10, max_attempts: 3 },
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Sampling parameters for one chat-completions call. The analysis and RAG
/// entry points each pass their own defaults (0.7/—/800 vs. 0.8/0.9/500).
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub max_tokens: u32,
}

impl SamplingParams {
    #[must_use]
    pub fn analysis_defaults() -> Self {
        SamplingParams { temperature: 0.7, top_p: None, max_tokens: 800 }
    }

    #[must_use]
    pub fn rag_defaults() -> Self {
        SamplingParams { temperature: 0.8, top_p: Some(0.9), max_tokens: 500 }
    }
}
