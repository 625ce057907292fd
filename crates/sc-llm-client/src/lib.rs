//! HTTP client to an OpenAI-compatible chat-completions endpoint, shared by
//! the correlator's periodic analysis cycle and the RAG orchestrator's
//! structured-answer generation. Both entry points contend for one rate
//! limiter and one circuit breaker, since they ultimately share the same
//! upstream model server's capacity.

mod analysis_payload;
mod client;
mod config;
mod error;
mod prompts;
mod wire;

pub use analysis_payload::AnalysisPayload;
pub use client::{GeneratedAnswer, LlmClient};
pub use config::{LlmClientConfig, SamplingParams};
pub use error::LlmClientError;
