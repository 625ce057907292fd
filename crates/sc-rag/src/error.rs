//! Failure domain for the RAG orchestrator. A failing retriever or a failed
//! structured LLM call degrades to a lower-confidence answer rather than
//! propagating — `RagError` exists for the handful of cases that genuinely
//! have nothing to answer with.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("transport error calling {source_name}: {message}")]
    Transport { source_name: String, message: String },
    #[error("http {status} from {source_name}")]
    Http { source_name: String, status: u16 },
    #[error("malformed response from {source_name}: {message}")]
    MalformedResponse { source_name: String, message: String },
    #[error("question must not be empty")]
    EmptyQuestion,
}
