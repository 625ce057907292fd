//! Transcription ingest client: joins `transcription:live` and feeds
//! decoded transcription fragments straight into the [`Correlator`].

use std::sync::Arc;

use chrono::Utc;
use futures_util::SinkExt;
use sc_correlator::Correlator;
use sc_protocol::timestamp::normalize_micros;
use sc_protocol::Transcription;
use sc_ws_foundation::{PhoenixEnvelope, ResilientClient, WsFoundationError, WsStream};
use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, warn};

use crate::decode::decode_timestamp_us;

#[derive(Debug, Deserialize)]
struct NewTranscriptionPayload {
    timestamp: Value,
    #[serde(default)]
    text: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct TranscriptionClient {
    url: String,
    correlator: Arc<Correlator>,
}

impl TranscriptionClient {
    #[must_use]
    pub fn new(url: impl Into<String>, correlator: Arc<Correlator>) -> Self {
        TranscriptionClient { url: url.into(), correlator }
    }
}

impl ResilientClient for TranscriptionClient {
    fn name(&self) -> &str {
        "transcription"
    }

    async fn do_connect(&self) -> Result<WsStream, WsFoundationError> {
        let (mut ws, _) =
            connect_async(&self.url).await.map_err(|e| WsFoundationError::Connect(e.to_string()))?;

        // The first ref on a fresh connection is always "1" — `RefCounter`
        // itself resets to the same value, so this stays consistent with
        // the heartbeat refs `ClientRuntime` sends once connected.
        let join = PhoenixEnvelope::phx_join("transcription:live", Value::Object(serde_json::Map::new()), "1".to_string());
        let json = serde_json::to_string(&join).map_err(|e| WsFoundationError::Serialization(e.to_string()))?;
        ws.send(Message::Text(json.into())).await.map_err(|e| WsFoundationError::Transport(e.to_string()))?;
        Ok(ws)
    }

    async fn do_handle_frame(&self, envelope: PhoenixEnvelope) -> Result<(), WsFoundationError> {
        match envelope.event.as_str() {
            "new_transcription" => {
                let payload: NewTranscriptionPayload = serde_json::from_value(envelope.payload)
                    .map_err(|e| WsFoundationError::Protocol(format!("malformed new_transcription payload: {e}")))?;
                let raw_us = decode_timestamp_us(&payload.timestamp).ok_or_else(|| {
                    WsFoundationError::Protocol("new_transcription payload carried no usable timestamp".to_string())
                })?;
                let timestamp_us = normalize_micros(raw_us, Utc::now());
                self.correlator
                    .add_transcription(Transcription {
                        timestamp_us,
                        text: payload.text,
                        duration_secs: payload.duration,
                        confidence: payload.confidence,
                    })
                    .await;
            }
            "connection_established" | "session_started" | "session_ended" | "transcription_stats" => {
                debug!(event = envelope.event, "transcription channel notice");
            }
            other => {
                warn!(event = other, "unrecognized transcription channel event");
            }
        }
        Ok(())
    }
}
