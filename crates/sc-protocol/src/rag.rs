//! RAG query/response wire shapes, shared by the HTTP and WebSocket query
//! surfaces.

use serde::{Deserialize, Serialize};

/// `POST /query` body, and the payload of a `{type:"rag_query"}` WebSocket
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagQuery {
    pub question: String,
    #[serde(default)]
    pub time_window_hours: Option<u32>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// How the LLM characterized its own answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Factual,
    Creative,
    Clarification,
    InsufficientData,
    /// Used when the LLM is unavailable or its structured reply failed to
    /// parse and a deterministic summary was synthesized instead.
    Fallback,
}

/// The structured reply shape returned by both the HTTP `POST /query`
/// endpoint and a `{type:"rag_response"}` WebSocket frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub success: bool,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub response_type: ResponseType,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub data_summary: serde_json::Value,
    pub sources: Vec<String>,
    pub time_window_hours: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
