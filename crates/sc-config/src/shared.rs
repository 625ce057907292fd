//! Configuration sections shared by both service binaries.

use clap::Args;

use crate::error::Validator;

#[derive(Debug, Clone, Args)]
pub struct HealthConfig {
    #[arg(long, env = "HEALTH__HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "HEALTH__PORT", default_value_t = 8891)]
    pub port: u16,
}

impl HealthConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.port >= 1024, "health.port must be >= 1024");
    }
}

#[derive(Debug, Clone, Args)]
pub struct LmsConfig {
    #[arg(long, env = "LMS__API_URL", default_value = "http://localhost:1234/v1")]
    pub api_url: String,
    #[arg(long, env = "LMS__MODEL", default_value = "local-model")]
    pub model: String,
    #[arg(long, env = "LMS__RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,
    #[arg(long, env = "LMS__RATE_WINDOW_SECS", default_value_t = 60)]
    pub rate_window_secs: u64,
    #[arg(long, env = "LMS__TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl LmsConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check(
            self.api_url.starts_with("http://") || self.api_url.starts_with("https://"),
            "lms.api_url must start with http:// or https://",
        );
        v.check((1..=100).contains(&self.rate_limit), "lms.rate_limit must be in 1..=100");
        v.check((10..=300).contains(&self.rate_window_secs), "lms.rate_window_secs must be in 10..=300");
        v.check((5..=120).contains(&self.timeout_secs), "lms.timeout_secs must be in 5..=120");
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    #[arg(long, env = "SERVER__BASE_URL", default_value = "http://localhost:7175")]
    pub base_url: String,
}

impl ServerConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check(
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://"),
            "server.base_url must start with http:// or https://",
        );
    }
}

#[derive(Debug, Clone, Args)]
pub struct VocabularyConfig {
    #[arg(long, env = "VOCABULARY__RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,
    #[arg(long, env = "VOCABULARY__RATE_WINDOW_SECS", default_value_t = 60)]
    pub rate_window_secs: u64,
    #[arg(long, env = "VOCABULARY__CACHE_MAX_ENTRIES", default_value_t = 1000)]
    pub cache_max_entries: u64,
    #[arg(long, env = "VOCABULARY__CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,
}

impl VocabularyConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check((1..=1000).contains(&self.rate_limit), "vocabulary.rate_limit must be in 1..=1000");
        v.check(self.cache_max_entries > 0, "vocabulary.cache_max_entries must be > 0");
    }
}

#[derive(Debug, Clone, Args)]
pub struct AuthConfig {
    #[arg(long, env = "AUTH__TOKEN")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CircuitBreakerConfig {
    #[arg(long, env = "CIRCUIT_BREAKER__FAILURE_THRESHOLD", default_value_t = 5)]
    pub failure_threshold: u32,
    #[arg(long, env = "CIRCUIT_BREAKER__RECOVERY_TIMEOUT_SECS", default_value_t = 300)]
    pub recovery_timeout_secs: u64,
}

impl CircuitBreakerConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check((1..=20).contains(&self.failure_threshold), "circuit_breaker.failure_threshold must be in 1..=20");
        v.check(
            (10..=600).contains(&self.recovery_timeout_secs),
            "circuit_breaker.recovery_timeout_secs must be in 10..=600",
        );
    }
}

#[derive(Debug, Clone, Args)]
pub struct WebSocketReconnectConfig {
    #[arg(long, env = "WEBSOCKET__RECONNECT_BASE_SECS", default_value_t = 1)]
    pub reconnect_base_secs: u64,
    #[arg(long, env = "WEBSOCKET__RECONNECT_CAP_SECS", default_value_t = 60)]
    pub reconnect_cap_secs: u64,
    #[arg(long, env = "WEBSOCKET__MAX_RECONNECT_ATTEMPTS", default_value_t = 10)]
    pub max_reconnect_attempts: u32,
    #[arg(long, env = "WEBSOCKET__HEARTBEAT_INTERVAL_SECS", default_value_t = 30)]
    pub heartbeat_interval_secs: u64,
}

impl WebSocketReconnectConfig {
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.reconnect_base_secs >= 1, "websocket.reconnect_base_secs must be >= 1");
        v.check(
            self.reconnect_cap_secs >= self.reconnect_base_secs,
            "websocket.reconnect_cap_secs must be >= reconnect_base_secs",
        );
        v.check(self.max_reconnect_attempts >= 1, "websocket.max_reconnect_attempts must be >= 1");
        v.check(self.heartbeat_interval_secs >= 1, "websocket.heartbeat_interval_secs must be >= 1");
    }
}
