//! Event ingest client: joins `events:all` and fans decoded chat messages
//! and viewer interactions into the [`Correlator`].

use std::sync::Arc;

use chrono::Utc;
use futures_util::SinkExt;
use sc_correlator::Correlator;
use sc_protocol::InteractionKind;
use sc_ws_foundation::{PhoenixEnvelope, ResilientClient, WsFoundationError, WsStream};
use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::warn;

use crate::decode::{build_chat_message, build_interaction, ChatData, InteractionData};

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

pub struct EventClient {
    url: String,
    correlator: Arc<Correlator>,
    native_emote_prefix: String,
}

impl EventClient {
    #[must_use]
    pub fn new(url: impl Into<String>, correlator: Arc<Correlator>, native_emote_prefix: impl Into<String>) -> Self {
        EventClient { url: url.into(), correlator, native_emote_prefix: native_emote_prefix.into() }
    }

    async fn handle_interaction(&self, payload: Value, kind: InteractionKind) -> Result<(), WsFoundationError> {
        let envelope: DataEnvelope<InteractionData> = serde_json::from_value(payload)
            .map_err(|e| WsFoundationError::Protocol(format!("malformed {kind} payload: {e}")))?;
        let now_ms = Utc::now().timestamp_millis();
        let interaction = build_interaction(envelope.data, kind, now_ms);
        self.correlator.add_interaction(interaction).await;
        Ok(())
    }
}

impl ResilientClient for EventClient {
    fn name(&self) -> &str {
        "events"
    }

    async fn do_connect(&self) -> Result<WsStream, WsFoundationError> {
        let (mut ws, _) =
            connect_async(&self.url).await.map_err(|e| WsFoundationError::Connect(e.to_string()))?;

        let join = PhoenixEnvelope::phx_join("events:all", Value::Object(serde_json::Map::new()), "1".to_string());
        let json = serde_json::to_string(&join).map_err(|e| WsFoundationError::Serialization(e.to_string()))?;
        ws.send(Message::Text(json.into())).await.map_err(|e| WsFoundationError::Transport(e.to_string()))?;
        Ok(ws)
    }

    async fn do_handle_frame(&self, envelope: PhoenixEnvelope) -> Result<(), WsFoundationError> {
        match envelope.event.as_str() {
            "chat_message" => {
                let data: DataEnvelope<ChatData> = serde_json::from_value(envelope.payload)
                    .map_err(|e| WsFoundationError::Protocol(format!("malformed chat_message payload: {e}")))?;
                let now_ms = Utc::now().timestamp_millis();
                let message = build_chat_message(data.data, &self.native_emote_prefix, now_ms);
                self.correlator.add_chat(message).await;
            }
            "follower" => self.handle_interaction(envelope.payload, InteractionKind::Follow).await?,
            "subscription" => self.handle_interaction(envelope.payload, InteractionKind::Subscription).await?,
            "gift_subscription" => self.handle_interaction(envelope.payload, InteractionKind::GiftSubscription).await?,
            "cheer" => self.handle_interaction(envelope.payload, InteractionKind::Cheer).await?,
            "raid" => self.handle_interaction(envelope.payload, InteractionKind::Raid).await?,
            "connection_established" => {}
            other => {
                warn!(event = other, "unrecognized events channel event");
            }
        }
        Ok(())
    }
}
