//! Resilient WebSocket client foundation shared by every upstream ingest
//! client: connection state machine, exponential backoff with jitter, a
//! per-client circuit breaker, and the Phoenix-channel wire dialect, all
//! driven generically by [`ClientRuntime`].

pub mod backoff;
pub mod circuit_breaker;
pub mod client;
pub mod error;
pub mod phoenix;
pub mod state;

pub use backoff::{delay_for_attempt, BackoffConfig};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use client::{ClientRuntime, ClientRuntimeConfig, ResilientClient, WsStream};
pub use error::WsFoundationError;
pub use phoenix::{PhoenixEnvelope, RefCounter};
pub use state::ConnectionState;
