//! `/health` + `/status` detail for the correlator service: buffer fill
//! ratios, the current session, and both ingest clients' connection state.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use sc_correlator::Correlator;
use sc_ingest_clients::{EventClient, TranscriptionClient};
use sc_runtime::health::StatusProvider;
use sc_ws_foundation::ClientRuntime;
use serde_json::{json, Value};

/// Snapshots `Correlator::status` periodically since it's async and
/// `StatusProvider` is read synchronously from an `axum` handler; the two
/// ingest clients' connection states are read live since `ClientRuntime`
/// exposes those through a `watch` channel instead.
pub struct CorrelatorStatusProvider {
    correlator: Arc<Correlator>,
    transcription: Arc<ClientRuntime<TranscriptionClient>>,
    events: Arc<ClientRuntime<EventClient>>,
    cached_buffers: StdMutex<Value>,
}

impl CorrelatorStatusProvider {
    #[must_use]
    pub fn new(
        correlator: Arc<Correlator>,
        transcription: Arc<ClientRuntime<TranscriptionClient>>,
        events: Arc<ClientRuntime<EventClient>>,
    ) -> Arc<Self> {
        Arc::new(CorrelatorStatusProvider { correlator, transcription, events, cached_buffers: StdMutex::new(json!({})) })
    }

    /// Refresh the cached buffer/session snapshot. Spawned as a periodic
    /// tracked background task by `main`.
    pub async fn refresh(&self) {
        let status = self.correlator.status().await;
        let value = json!({
            "transcriptions": buffer_json(status.transcriptions),
            "chat": buffer_json(status.chat),
            "emotes": buffer_json(status.emotes),
            "interactions": buffer_json(status.interactions),
            "current_session": status.current_session,
            "context_window_age_secs": status.context_window_age_secs,
        });
        *self.cached_buffers.lock().unwrap() = value;
    }

    pub async fn refresh_loop(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.refresh().await;
        }
    }

    fn connections(&self) -> Value {
        json!({
            "transcription": self.transcription.state().as_str(),
            "events": self.events.state().as_str(),
        })
    }
}

fn buffer_json(stats: sc_correlator::BufferStats) -> Value {
    json!({
        "len": stats.len,
        "max_size": stats.max_size,
        "overflow_count": stats.overflow_count,
        "fill_ratio": stats.fill_ratio(),
    })
}

impl StatusProvider for CorrelatorStatusProvider {
    fn health_extra(&self) -> (bool, Value) {
        let buffers = self.cached_buffers.lock().unwrap().clone();
        let is_warning = ["transcriptions", "chat", "emotes", "interactions"]
            .iter()
            .any(|key| buffers.get(key).and_then(|b| b.get("fill_ratio")).and_then(Value::as_f64).unwrap_or(0.0) >= 0.8);
        (is_warning, json!({"buffers": buffers, "connections": self.connections()}))
    }

    fn status_snapshot(&self) -> Value {
        let buffers = self.cached_buffers.lock().unwrap().clone();
        json!({
            "buffers": buffers,
            "connections": self.connections(),
        })
    }
}
