//! Top-level configuration for the correlator service binary.

use clap::{Args, Parser};

use crate::error::{ConfigError, Validator};
use crate::shared::{AuthConfig, CircuitBreakerConfig, HealthConfig, LmsConfig, ServerConfig, WebSocketReconnectConfig};

#[derive(Debug, Clone, Args)]
pub struct WebSocketUrlsConfig {
    #[arg(
        long,
        env = "WEBSOCKET__TRANSCRIPTION_URL",
        default_value = "ws://localhost:7175/socket/websocket"
    )]
    pub transcription_url: String,
    #[arg(long, env = "WEBSOCKET__EVENTS_URL", default_value = "ws://localhost:7175/socket/websocket")]
    pub events_url: String,
    #[command(flatten)]
    pub reconnect: WebSocketReconnectConfig,
}

#[derive(Debug, Clone, Args)]
pub struct CorrelatorParamsConfig {
    #[arg(long, env = "CORRELATOR__CONTEXT_WINDOW_SECS", default_value_t = 120)]
    pub context_window_secs: u64,
    #[arg(long, env = "CORRELATOR__ANALYSIS_INTERVAL_SECS", default_value_t = 30)]
    pub analysis_interval_secs: u64,
    #[arg(long, env = "CORRELATOR__ANALYSIS_COOLDOWN_SECS", default_value_t = 10)]
    pub analysis_cooldown_secs: u64,
    #[arg(long, env = "CORRELATOR__CORRELATION_WINDOW_SECS", default_value_t = 10)]
    pub correlation_window_secs: u64,
    #[arg(long, env = "CORRELATOR__RETENTION_WINDOW_SECS", default_value_t = 120)]
    pub retention_window_secs: u64,
    #[arg(long, env = "CORRELATOR__MAX_BUFFER_SIZE", default_value_t = 1000)]
    pub max_buffer_size: usize,
    #[arg(long, env = "CORRELATOR__NATIVE_EMOTE_PREFIX", default_value = "")]
    pub native_emote_prefix: String,
}

impl CorrelatorParamsConfig {
    fn validate(&self, v: &mut Validator) {
        v.check(
            (30..=600).contains(&self.context_window_secs),
            "correlator.context_window_secs must be in 30..=600",
        );
        v.check(
            (10..=120).contains(&self.analysis_interval_secs),
            "correlator.analysis_interval_secs must be in 10..=120",
        );
        v.check(
            (2..=30).contains(&self.correlation_window_secs),
            "correlator.correlation_window_secs must be in 2..=30",
        );
        v.check(
            (100..=10_000).contains(&self.max_buffer_size),
            "correlator.max_buffer_size must be in 100..=10000",
        );
    }
}

/// Resolved configuration for the correlator service, parsed once from the
/// environment in `main` and threaded into every constructor that needs it.
#[derive(Debug, Clone, Parser)]
#[command(name = "correlator-service")]
pub struct CorrelatorServiceConfig {
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
    #[arg(long, env = "TIMEZONE", default_value = "America/Los_Angeles")]
    pub timezone: String,

    #[command(flatten)]
    pub health: HealthConfig,
    #[command(flatten)]
    pub websocket: WebSocketUrlsConfig,
    #[command(flatten)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[command(flatten)]
    pub correlator: CorrelatorParamsConfig,
    #[command(flatten)]
    pub lms: LmsConfig,
    #[command(flatten)]
    pub server: ServerConfig,
    #[command(flatten)]
    pub auth: AuthConfig,
}

impl CorrelatorServiceConfig {
    /// Parse from the process environment and command line, failing fast
    /// with every invalid field named at once.
    pub fn load() -> Result<Self, ConfigError> {
        let config = <Self as Parser>::parse();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut v = Validator::new();
        v.check(
            self.timezone.parse::<chrono_tz::Tz>().is_ok(),
            format!("timezone '{}' is not a recognized IANA timezone", self.timezone),
        );
        self.health.validate(&mut v);
        self.websocket.reconnect.validate(&mut v);
        self.circuit_breaker.validate(&mut v);
        self.correlator.validate(&mut v);
        self.lms.validate(&mut v);
        self.server.validate(&mut v);
        v.finish()
    }

    /// A copy of this config with the bearer token (if any) redacted, safe
    /// to log at startup.
    #[must_use]
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "log_level": self.log_level,
            "json_logs": self.json_logs,
            "timezone": self.timezone,
            "health": {"host": self.health.host, "port": self.health.port},
            "websocket": {
                "transcription_url": self.websocket.transcription_url,
                "events_url": self.websocket.events_url,
            },
            "lms": {"api_url": self.lms.api_url, "model": self.lms.model},
            "server": {"base_url": self.server.base_url},
            "auth_token_set": self.auth.token.is_some(),
        })
    }
}
