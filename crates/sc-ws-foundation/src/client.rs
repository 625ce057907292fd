//! Generic resilient WebSocket client driver: owns the connect/reconnect
//! loop, the Phoenix heartbeat, backoff, and the circuit breaker, so each
//! concrete ingest client only has to supply its own connect/frame-handling
//! logic through [`ResilientClient`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use sc_runtime::{guarded, TaskTracker};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{error, warn};

use crate::backoff::{delay_for_attempt, BackoffConfig};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::error::WsFoundationError;
use crate::phoenix::{PhoenixEnvelope, RefCounter};
use crate::state::ConnectionState;

/// The concrete stream type returned by `tokio_tungstenite::connect_async`,
/// over either a plain or TLS-wrapped TCP socket.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Per-client hooks a resilient connection drives through its lifecycle.
/// Implementors own only what is specific to one upstream: how to connect
/// (including any join handshake) and how to react to an inbound frame.
/// `ClientRuntime` supplies the reconnect loop, backoff, circuit breaking,
/// and the Phoenix heartbeat around it.
pub trait ResilientClient: Send + Sync + 'static {
    /// A human-readable name, used in logs and on `/status`.
    fn name(&self) -> &str;

    /// Open the underlying WebSocket connection and perform any
    /// protocol-level join handshake (e.g. sending `phx_join`).
    fn do_connect(&self) -> impl Future<Output = Result<WsStream, WsFoundationError>> + Send;

    /// Handle one already-decoded inbound frame.
    fn do_handle_frame(
        &self,
        envelope: PhoenixEnvelope,
    ) -> impl Future<Output = Result<(), WsFoundationError>> + Send;

    /// Called once a connection is torn down, before a reconnect attempt.
    /// The default does nothing.
    fn do_disconnect(&self) {}
}

/// Tunables for a [`ClientRuntime`].
#[derive(Debug, Clone, Copy)]
pub struct ClientRuntimeConfig {
    pub backoff: BackoffConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub heartbeat_interval: Duration,
    pub max_missed_heartbeats: u32,
}

impl Default for ClientRuntimeConfig {
    fn default() -> Self {
        ClientRuntimeConfig {
            backoff: BackoffConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            heartbeat_interval: Duration::from_secs(30),
            max_missed_heartbeats: 3,
        }
    }
}

/// Drives one [`ResilientClient`] through connect, listen, heartbeat,
/// failure, and reconnect, exposing its current [`ConnectionState`] to
/// observers via a `watch` channel.
pub struct ClientRuntime<C: ResilientClient> {
    client: Arc<C>,
    cfg: ClientRuntimeConfig,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    tasks: TaskTracker,
}

impl<C: ResilientClient> ClientRuntime<C> {
    #[must_use]
    pub fn new(client: C, cfg: ClientRuntimeConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        ClientRuntime { client: Arc::new(client), cfg, state_tx, state_rx, tasks: TaskTracker::new() }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Spawn the connect/reconnect loop as a tracked background task. The
    /// runtime must be held in an `Arc` so the loop can outlive the call.
    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let name = format!("{}-ws-loop", this.client.name());
        self.tasks.spawn_tracked(name, async move {
            this.drive().await;
        });
    }

    async fn drive(self: Arc<Self>) {
        let mut breaker = CircuitBreaker::new(self.cfg.circuit_breaker);
        let refs = RefCounter::new();
        let mut attempt: u32 = 0;

        loop {
            if breaker.is_open(Instant::now()) {
                let _ = self.state_tx.send(ConnectionState::Failed);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let _ = self.state_tx.send(ConnectionState::Connecting);
            refs.reset();

            match self.run_connection(&refs, &mut breaker, &mut attempt).await {
                Err(err) => {
                    warn!(client = self.client.name(), error = %err, "connection ended");
                    self.client.do_disconnect();
                    breaker.record_failure(Instant::now());
                    attempt += 1;
                    if attempt > self.cfg.backoff.max_attempts {
                        error!(client = self.client.name(), attempts = attempt, "reconnect attempts exhausted");
                        let _ = self.state_tx.send(ConnectionState::Failed);
                        return;
                    }
                    let _ = self.state_tx.send(ConnectionState::Reconnecting);
                    let delay = delay_for_attempt(&self.cfg.backoff, attempt);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Connect, mark connected, and drive frames + heartbeat until the
    /// connection ends. A successful connect resets `attempt` and the
    /// circuit breaker immediately, since reaching `Connected` proves the
    /// upstream is reachable regardless of how the session later ends.
    async fn run_connection(
        &self,
        refs: &RefCounter,
        breaker: &mut CircuitBreaker,
        attempt: &mut u32,
    ) -> Result<(), WsFoundationError> {
        let ws = self.client.do_connect().await?;
        let _ = self.state_tx.send(ConnectionState::Connected);
        breaker.record_success();
        *attempt = 0;

        let (mut sink, mut stream) = ws.split();
        let mut ticker = tokio::time::interval(self.cfg.heartbeat_interval);
        ticker.tick().await;
        let mut missed_heartbeats = 0u32;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let envelope = PhoenixEnvelope::heartbeat(refs.next());
                    let json = serde_json::to_string(&envelope)
                        .map_err(|e| WsFoundationError::Serialization(e.to_string()))?;
                    match sink.send(Message::Text(json.into())).await {
                        Ok(()) => missed_heartbeats = 0,
                        Err(e) => {
                            missed_heartbeats += 1;
                            warn!(
                                client = self.client.name(),
                                error = %e,
                                missed_heartbeats,
                                "heartbeat send failed"
                            );
                            if missed_heartbeats >= self.cfg.max_missed_heartbeats {
                                return Err(WsFoundationError::Transport(
                                    "missed heartbeat threshold reached".to_string(),
                                ));
                            }
                        }
                    }
                }
                frame = stream.next() => {
                    match frame {
                        None => return Err(WsFoundationError::Disconnected),
                        Some(Err(e)) => return Err(WsFoundationError::Transport(e.to_string())),
                        Some(Ok(Message::Text(text))) => {
                            match PhoenixEnvelope::parse(&text) {
                                Some(envelope) => {
                                    guarded(self.client.name(), self.client.do_handle_frame(envelope)).await;
                                }
                                None => warn!(client = self.client.name(), "received unparseable frame"),
                            }
                        }
                        Some(Ok(Message::Close(_))) => return Err(WsFoundationError::Disconnected),
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    /// Abort the connect loop and await its shutdown up to `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        self.tasks.shutdown(timeout).await;
    }
}
