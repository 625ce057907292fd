//! Failure domain for the Context HTTP client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextClientError {
    #[error("context record failed client-side validation: {0}")]
    Validation(String),
    #[error("request transport error: {0}")]
    Transport(String),
    #[error("server rejected the record (422): {0}")]
    Rejected(String),
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },
    #[error("response body was not valid JSON: {0}")]
    MalformedResponse(String),
}
