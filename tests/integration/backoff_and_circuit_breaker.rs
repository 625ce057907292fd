//! End-to-end exercise of `ClientRuntime`'s reconnect loop against a
//! `ResilientClient` that never connects, and against a real local
//! WebSocket listener: exponential backoff exhaustion, circuit-breaker
//! fail-fast-then-recover, and a successful connect resetting both.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use std::future::Future;

use sc_ws_foundation::{
    BackoffConfig, CircuitBreakerConfig, ClientRuntime, ClientRuntimeConfig, ConnectionState, PhoenixEnvelope, ResilientClient,
    WsFoundationError,
};
use tokio::net::TcpListener;

/// A client whose connect attempts always fail, counting how many were
/// made.
struct AlwaysFailsClient {
    attempts: AtomicU32,
}

impl ResilientClient for AlwaysFailsClient {
    fn name(&self) -> &str {
        "always-fails"
    }

    fn do_connect(&self) -> impl Future<Output = Result<sc_ws_foundation::WsStream, WsFoundationError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(WsFoundationError::Connect("refused".to_string())) }
    }

    fn do_handle_frame(&self, _envelope: PhoenixEnvelope) -> impl Future<Output = Result<(), WsFoundationError>> + Send {
        async { Ok(()) }
    }
}

async fn wait_for_state(rx: &mut tokio::sync::watch::Receiver<ConnectionState>, target: ConnectionState, bound: Duration) -> ConnectionState {
    tokio::time::timeout(bound, async {
        loop {
            if *rx.borrow() == target {
                return;
            }
            rx.changed().await.expect("runtime dropped its sender");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never observed state {target:?} within {bound:?}"));
    *rx.borrow()
}

#[tokio::test]
async fn exhausted_backoff_attempts_settle_in_failed_state() {
    let client = AlwaysFailsClient { attempts: AtomicU32::new(0) };
    let cfg = ClientRuntimeConfig {
        backoff: BackoffConfig { base_secs: 0, cap_secs: 0, max_attempts: 3 },
        circuit_breaker: CircuitBreakerConfig { failure_threshold: 100, recovery_timeout: Duration::from_secs(300) },
        heartbeat_interval: Duration::from_secs(30),
        max_missed_heartbeats: 3,
    };
    let runtime = Arc::new(ClientRuntime::new(client, cfg));
    let mut rx = runtime.subscribe();
    runtime.start();

    wait_for_state(&mut rx, ConnectionState::Failed, Duration::from_secs(2)).await;
    assert!(runtime.client().attempts.load(Ordering::SeqCst) >= 4, "expected the loop to retry past max_attempts before giving up");

    runtime.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn circuit_breaker_fails_fast_then_attempts_recovery() {
    let client = AlwaysFailsClient { attempts: AtomicU32::new(0) };
    let cfg = ClientRuntimeConfig {
        backoff: BackoffConfig { base_secs: 0, cap_secs: 0, max_attempts: 1_000 },
        circuit_breaker: CircuitBreakerConfig { failure_threshold: 2, recovery_timeout: Duration::from_millis(200) },
        heartbeat_interval: Duration::from_secs(30),
        max_missed_heartbeats: 3,
    };
    let runtime = Arc::new(ClientRuntime::new(client, cfg));
    let mut rx = runtime.subscribe();
    runtime.start();

    // With max_attempts this high, `Failed` can only appear via the
    // breaker's fail-fast branch — backoff exhaustion is nowhere near yet.
    wait_for_state(&mut rx, ConnectionState::Failed, Duration::from_secs(2)).await;
    let attempts_when_opened = runtime.client().attempts.load(Ordering::SeqCst);
    assert!(attempts_when_opened >= 2, "breaker should open only after reaching its failure threshold");

    // Recovery: once `recovery_timeout` elapses the breaker lets another
    // connect attempt through, so the state leaves `Failed` again.
    wait_for_state(&mut rx, ConnectionState::Connecting, Duration::from_secs(3)).await;
    assert!(
        runtime.client().attempts.load(Ordering::SeqCst) > attempts_when_opened,
        "recovery attempt should have made at least one more connect call"
    );

    runtime.shutdown(Duration::from_secs(1)).await;
}

struct ClosesImmediatelyClient {
    addr: String,
    connected: AtomicU32,
}

impl ResilientClient for ClosesImmediatelyClient {
    fn name(&self) -> &str {
        "closes-immediately"
    }

    fn do_connect(&self) -> impl Future<Output = Result<sc_ws_foundation::WsStream, WsFoundationError>> + Send {
        async move {
            let url = format!("ws://{}/socket", self.addr);
            let (stream, _response) =
                tokio_tungstenite::connect_async(&url).await.map_err(|e| WsFoundationError::Connect(e.to_string()))?;
            self.connected.fetch_add(1, Ordering::SeqCst);
            Ok(stream)
        }
    }

    fn do_handle_frame(&self, _envelope: PhoenixEnvelope) -> impl Future<Output = Result<(), WsFoundationError>> + Send {
        async { Ok(()) }
    }
}

#[tokio::test]
async fn a_successful_connect_reaches_connected_then_reconnects_on_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _peer)) = listener.accept().await else { return };
            tokio::spawn(async move {
                // Accept the handshake, then drop the stream, closing the
                // connection right back — enough to exercise Connected ->
                // Reconnecting without a full Phoenix server.
                let _ = tokio_tungstenite::accept_async(stream).await;
            });
        }
    });

    let client = ClosesImmediatelyClient { addr: addr.to_string(), connected: AtomicU32::new(0) };
    let cfg = ClientRuntimeConfig {
        backoff: BackoffConfig { base_secs: 0, cap_secs: 0, max_attempts: 1_000 },
        circuit_breaker: CircuitBreakerConfig { failure_threshold: 100, recovery_timeout: Duration::from_secs(300) },
        heartbeat_interval: Duration::from_secs(30),
        max_missed_heartbeats: 3,
    };
    let runtime = Arc::new(ClientRuntime::new(client, cfg));
    let mut rx = runtime.subscribe();
    runtime.start();

    wait_for_state(&mut rx, ConnectionState::Connected, Duration::from_secs(2)).await;
    wait_for_state(&mut rx, ConnectionState::Reconnecting, Duration::from_secs(2)).await;
    assert!(runtime.client().connected.load(Ordering::SeqCst) >= 1);

    runtime.shutdown(Duration::from_secs(1)).await;
}
