//! Top-level configuration for the RAG service binary.

use clap::Parser;

use crate::error::{ConfigError, Validator};
use crate::shared::{AuthConfig, HealthConfig, LmsConfig, ServerConfig, VocabularyConfig};

/// Resolved configuration for the RAG service, parsed once from the
/// environment in `main`.
#[derive(Debug, Clone, Parser)]
#[command(name = "rag-service")]
pub struct RagServiceConfig {
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
    #[arg(long, env = "TIMEZONE", default_value = "America/Los_Angeles")]
    pub timezone: String,
    #[arg(long, env = "DEFAULT_TIME_WINDOW_HOURS", default_value_t = 24)]
    pub default_time_window_hours: u32,

    #[command(flatten)]
    pub health: HealthConfig,
    #[command(flatten)]
    pub lms: LmsConfig,
    #[command(flatten)]
    pub server: ServerConfig,
    #[command(flatten)]
    pub vocabulary: VocabularyConfig,
    #[command(flatten)]
    pub auth: AuthConfig,
}

impl RagServiceConfig {
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
        v.check(self.default_time_window_hours >= 1, "default_time_window_hours must be >= 1");
        self.health.validate(&mut v);
        self.lms.validate(&mut v);
        self.server.validate(&mut v);
        self.vocabulary.validate(&mut v);
        v.finish()
    }

    #[must_use]
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "log_level": self.log_level,
            "json_logs": self.json_logs,
            "timezone": self.timezone,
            "health": {"host": self.health.host, "port": self.health.port},
            "lms": {"api_url": self.lms.api_url, "model": self.lms.model},
            "server": {"base_url": self.server.base_url},
            "auth_token_set": self.auth.token.is_some(),
        })
    }
}
