//! HTTP client for the context-storage service: POSTs assembled context
//! records and GETs historical contexts for the RAG orchestrator's
//! read paths.

mod client;
mod error;

pub use client::{ContextClient, ContextClientConfig};
pub use error::ContextClientError;
