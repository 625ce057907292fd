//! Error kinds for the resilient WebSocket foundation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsFoundationError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("websocket transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("circuit breaker open; retry after {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },
    #[error("disconnected")]
    Disconnected,
}
