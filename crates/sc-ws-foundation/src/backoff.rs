//! Exponential backoff with jitter, shared by every reconnect loop.

use rand::Rng;
use std::time::Duration;

/// Reconnect backoff parameters.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base_secs: u64,
    pub cap_secs: u64,
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig { base_secs: 1, cap_secs: 60, max_attempts: 10 }
    }
}

/// `min(base * 2^(attempt-1), cap)`, multiplied by `1 + U[0, 0.1]` jitter.
/// `attempt` is 1-indexed (the first retry is attempt 1).
#[must_use]
pub fn delay_for_attempt(cfg: &BackoffConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(63);
    let unjittered_secs = (cfg.base_secs.saturating_mul(1u64 << exponent)).min(cfg.cap_secs);
    let jitter = rand::thread_rng().gen_range(0.0..0.1);
    let jittered_secs = unjittered_secs as f64 * (1.0 + jitter);
    Duration::from_secs_f64(jittered_secs)
}
