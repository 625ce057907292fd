//! The `POST /query` HTTP surface and the `/ws` WebSocket surface, both
//! backed by one shared `RagOrchestrator`.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use sc_protocol::RagQuery;
use sc_rag::RagOrchestrator;
use serde_json::json;
use tracing::{debug, warn};

use crate::status::RagStatusProvider;

#[derive(Clone)]
pub struct QueryState {
    pub orchestrator: Arc<RagOrchestrator>,
    pub status: Arc<RagStatusProvider>,
}

#[must_use]
pub fn router(state: QueryState) -> Router {
    Router::new().route("/query", post(query_handler)).route("/ws", get(ws_handler)).with_state(state)
}

async fn query_handler(State(state): State<QueryState>, Json(query): Json<RagQuery>) -> impl IntoResponse {
    match state.orchestrator.answer(&query.question, query.time_window_hours).await {
        Ok(response) => {
            state.status.record_success();
            (axum::http::StatusCode::OK, Json(json!(response)))
        }
        Err(err) => {
            state.status.record_failure();
            warn!(error = %err, "rag query failed");
            (axum::http::StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"success": false, "error": err.to_string()})))
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<QueryState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One connection's read loop. A malformed frame or a handler error is
/// reported back on the socket and the loop continues — the same
/// "log, don't tear down" policy the ingest clients use for bad frames.
async fn handle_socket(mut socket: WebSocket, state: QueryState) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(raw) = message else { continue };

        let is_rag_query = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get("type").and_then(serde_json::Value::as_str).map(str::to_string))
            .is_some_and(|t| t == "rag_query");

        if !is_rag_query {
            debug!("ignoring non rag_query frame on rag websocket");
            continue;
        }

        let reply = match sc_rag::handle_query(&state.orchestrator, &raw).await {
            Ok(response) => {
                state.status.record_success();
                serde_json::to_string(&response)
            }
            Err(error) => {
                state.status.record_failure();
                serde_json::to_string(&error)
            }
        };

        match reply {
            Ok(text) => {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to serialize rag websocket reply");
            }
        }
    }
}
