//! Transcription egress client: publishes locally produced transcriptions
//! back upstream over the same Phoenix dialect the ingest clients consume.
//!
//! [`ResilientClient`]/[`ClientRuntime`] are built purely around inbound
//! frame dispatch — the connection's sink lives only inside
//! `run_connection`'s stack frame and is never handed back to a caller.
//! Publishing needs the opposite shape: a long-lived handle callers can
//! push frames through whenever they like. Rather than reworking that
//! already-settled abstraction, this client is its own small driver built
//! from the same primitives (backoff, circuit breaker, the Phoenix
//! envelope, the connection-state machine, tracked tasks).

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use sc_protocol::timestamp::format_iso8601;
use sc_protocol::Transcription;
use sc_runtime::TaskTracker;
use sc_ws_foundation::client::{ClientRuntimeConfig, WsStream};
use sc_ws_foundation::{delay_for_attempt, CircuitBreaker, ConnectionState, PhoenixEnvelope, RefCounter, WsFoundationError};
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, warn};

type EgressSink = SplitSink<WsStream, Message>;

/// Publishes `submit_transcription` frames on `transcription:live`,
/// reconnecting with the same backoff/circuit-breaker policy every other
/// edge uses.
pub struct PhoenixEgressClient {
    url: String,
    topic: String,
    cfg: ClientRuntimeConfig,
    refs: RefCounter,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    sink: Mutex<Option<EgressSink>>,
    tasks: TaskTracker,
}

impl PhoenixEgressClient {
    #[must_use]
    pub fn new(url: impl Into<String>, cfg: ClientRuntimeConfig) -> Arc<Self> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Arc::new(PhoenixEgressClient {
            url: url.into(),
            topic: "transcription:live".to_string(),
            cfg,
            refs: RefCounter::new(),
            state_tx,
            state_rx,
            sink: Mutex::new(None),
            tasks: TaskTracker::new(),
        })
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Spawn the connect/reconnect loop as a tracked background task.
    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.tasks.spawn_tracked("egress-ws-loop", async move {
            this.drive().await;
        });
    }

    async fn drive(self: Arc<Self>) {
        let mut breaker = CircuitBreaker::new(self.cfg.circuit_breaker);
        let mut attempt: u32 = 0;

        loop {
            if breaker.is_open(Instant::now()) {
                let _ = self.state_tx.send(ConnectionState::Failed);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let _ = self.state_tx.send(ConnectionState::Connecting);
            self.refs.reset();

            if let Err(err) = self.run_connection(&mut breaker, &mut attempt).await {
                warn!(error = %err, "egress connection ended");
                *self.sink.lock().await = None;
                breaker.record_failure(Instant::now());
                attempt += 1;
                if attempt > self.cfg.backoff.max_attempts {
                    warn!(attempts = attempt, "egress reconnect attempts exhausted");
                    let _ = self.state_tx.send(ConnectionState::Failed);
                    return;
                }
                let _ = self.state_tx.send(ConnectionState::Reconnecting);
                tokio::time::sleep(delay_for_attempt(&self.cfg.backoff, attempt)).await;
            }
        }
    }

    async fn run_connection(&self, breaker: &mut CircuitBreaker, attempt: &mut u32) -> Result<(), WsFoundationError> {
        let (ws, _) = connect_async(&self.url).await.map_err(|e| WsFoundationError::Connect(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        let join = PhoenixEnvelope::phx_join(self.topic.clone(), Value::Object(serde_json::Map::new()), self.refs.next());
        let json_text = serde_json::to_string(&join).map_err(|e| WsFoundationError::Serialization(e.to_string()))?;
        sink.send(Message::Text(json_text.into())).await.map_err(|e| WsFoundationError::Transport(e.to_string()))?;

        *self.sink.lock().await = Some(sink);
        let _ = self.state_tx.send(ConnectionState::Connected);
        breaker.record_success();
        *attempt = 0;

        loop {
            match stream.next().await {
                None => return Err(WsFoundationError::Disconnected),
                Some(Err(e)) => return Err(WsFoundationError::Transport(e.to_string())),
                Some(Ok(Message::Text(text))) => {
                    if let Some(envelope) = PhoenixEnvelope::parse(&text) {
                        debug!(event = envelope.event, "egress channel reply");
                    }
                }
                Some(Ok(Message::Close(_))) => return Err(WsFoundationError::Disconnected),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Leave the channel and close the socket, if connected.
    pub async fn disconnect(&self) {
        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let leave = PhoenixEnvelope::phx_leave(self.topic.clone(), self.refs.next());
            if let Ok(json_text) = serde_json::to_string(&leave) {
                let _ = sink.send(Message::Text(json_text.into())).await;
            }
            let _ = sink.close().await;
        }
        let _ = self.state_tx.send(ConnectionState::Disconnected);
    }

    /// Publish one transcription as `submit_transcription`. Fails
    /// immediately with `Disconnected` rather than buffering when no
    /// connection is currently up; the caller's own retry cadence (the
    /// reconnect loop) is what makes a subsequent call eventually succeed.
    pub async fn submit_transcription(
        &self,
        transcription: &Transcription,
        source_id: &str,
        stream_session_id: &str,
        language: &str,
        tz: &Tz,
    ) -> Result<(), WsFoundationError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(WsFoundationError::Disconnected)?;

        let payload = json!({
            "timestamp": format_iso8601(transcription.timestamp_us, tz),
            "duration": transcription.duration_secs,
            "text": transcription.text,
            "source_id": source_id,
            "stream_session_id": stream_session_id,
            "confidence": transcription.confidence,
            "metadata": {
                "original_timestamp_us": transcription.timestamp_us,
                "source": source_id,
                "language": language,
            },
        });
        let envelope = PhoenixEnvelope::new(self.topic.clone(), "submit_transcription", payload, self.refs.next());
        let json_text = serde_json::to_string(&envelope).map_err(|e| WsFoundationError::Serialization(e.to_string()))?;
        sink.send(Message::Text(json_text.into())).await.map_err(|e| WsFoundationError::Transport(e.to_string()))
    }

    pub async fn shutdown(&self, timeout: Duration) {
        self.disconnect().await;
        self.tasks.shutdown(timeout).await;
    }
}
