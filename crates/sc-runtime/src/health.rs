//! The `/health` and `/status` HTTP surface every service binary exposes,
//! a small `axum` status router shared across services.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

/// A per-service snapshot provider. Implemented once per service binary to
/// surface whatever domain-specific detail belongs in `/health`'s warning
/// flag and `/status`'s component breakdown (buffer fill ratios, WS client
/// connection state, circuit-breaker state, and so on).
pub trait StatusProvider: Send + Sync {
    /// Extra fields merged into the `/health` response, and whether they
    /// constitute a `"warning"` rather than `"healthy"` status.
    fn health_extra(&self) -> (bool, Value);

    /// The full component breakdown returned by `/status`.
    fn status_snapshot(&self) -> Value;
}

struct HealthState {
    service_name: String,
    started_at: Instant,
    provider: Arc<dyn StatusProvider>,
}

/// Build the shared `/health` + `/status` router for `service_name`,
/// backed by `provider` for domain-specific detail.
#[must_use]
pub fn health_router(service_name: impl Into<String>, provider: Arc<dyn StatusProvider>) -> Router {
    let state = Arc::new(HealthState {
        service_name: service_name.into(),
        started_at: Instant::now(),
        provider,
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    let (is_warning, extra) = state.provider.health_extra();
    let status = if is_warning { "warning" } else { "healthy" };
    let mut body = json!({
        "status": status,
        "service": state.service_name,
        "uptime_seconds": state.started_at.elapsed().as_secs_f64(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    if let (Value::Object(body_map), Value::Object(extra_map)) = (&mut body, extra) {
        body_map.extend(extra_map);
    }
    Json(body)
}

async fn status_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(state.provider.status_snapshot())
}
