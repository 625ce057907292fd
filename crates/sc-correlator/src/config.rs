//! Tunables for [`crate::correlator::Correlator`]. Built by the correlator
//! service binary from `sc_config::CorrelatorServiceConfig` rather than
//! depending on `sc-config` here, keeping this crate usable standalone.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    pub context_window: Duration,
    pub analysis_interval: Duration,
    pub analysis_cooldown: Duration,
    pub correlation_window: Duration,
    pub retention_window: Duration,
    pub max_buffer_size: usize,
    pub native_emote_prefix: String,
    pub timezone: chrono_tz::Tz,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        CorrelatorConfig {
            context_window: Duration::from_secs(120),
            analysis_interval: Duration::from_secs(30),
            analysis_cooldown: Duration::from_secs(10),
            correlation_window: Duration::from_secs(10),
            retention_window: Duration::from_secs(120),
            max_buffer_size: 1000,
            native_emote_prefix: String::new(),
            timezone: chrono_tz::America::Los_Angeles,
        }
    }
}
