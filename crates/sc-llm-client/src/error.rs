//! Failure domain for calls to the upstream LLM chat-completions endpoint.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmClientError {
    #[error("request transport error: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },
    #[error("request serialization error: {0}")]
    Serialization(String),
    #[error("response body was not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("rate limit wait ceiling exceeded")]
    RateLimited,
    #[error("circuit breaker open; retry after {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },
    #[error("request exceeded {timeout_secs}s timeout")]
    Timeout { timeout_secs: u64 },
}
