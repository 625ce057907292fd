//! Failure domain for the community-vocabulary HTTP client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabularyClientError {
    #[error("request transport error: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },
    #[error("response body was not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("rate limit wait ceiling exceeded")]
    RateLimited,
}
