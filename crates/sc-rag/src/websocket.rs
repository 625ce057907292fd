//! The WebSocket query surface: message shapes and dispatch logic for the
//! `rag_query` / `rag_response` / `rag_error` exchange. The actual socket
//! plumbing lives in the service binary; this module owns everything that
//! can be unit tested without one.

use sc_protocol::{RagQuery, RagResponse};
use serde::{Deserialize, Serialize};

use crate::orchestrator::RagOrchestrator;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename = "rag_query")]
pub struct RagQueryMessage {
    #[serde(flatten)]
    pub query: RagQuery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "rag_response")]
pub struct RagResponseMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(flatten)]
    pub response: RagResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "rag_error")]
pub struct RagErrorMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub success: bool,
    pub error: String,
}

/// Parse one incoming frame and dispatch it to the orchestrator, returning
/// the exact frame to send back. Never panics on malformed input; callers
/// should already have confirmed `{"type": "rag_query"}` before attempting
/// to parse the rest of the envelope.
pub async fn handle_query(orchestrator: &RagOrchestrator, raw: &str) -> Result<RagResponseMessage, RagErrorMessage> {
    let parsed: Result<RagQueryMessage, _> = serde_json::from_str(raw);
    let query = match parsed {
        Ok(query) => query,
        Err(e) => return Err(RagErrorMessage { correlation_id: None, success: false, error: format!("malformed rag_query: {e}") }),
    };

    let RagQuery { question, time_window_hours, correlation_id } = query.query;
    match orchestrator.answer(&question, time_window_hours).await {
        Ok(response) => Ok(RagResponseMessage { correlation_id, response }),
        Err(err) => Err(RagErrorMessage { correlation_id, success: false, error: err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_query_message_deserializes_without_optional_fields() {
        let raw = r#"{"type":"rag_query","question":"how many subs?"}"#;
        let query: RagQueryMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(query.query.question, "how many subs?");
        assert!(query.query.time_window_hours.is_none());
        assert!(query.query.correlation_id.is_none());
    }

    #[test]
    fn rag_query_message_keeps_the_correlation_id() {
        let raw = r#"{"type":"rag_query","question":"q","correlation_id":"abc123","time_window_hours":6}"#;
        let query: RagQueryMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(query.query.correlation_id.as_deref(), Some("abc123"));
        assert_eq!(query.query.time_window_hours, Some(6));
    }
}
