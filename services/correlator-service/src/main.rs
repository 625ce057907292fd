mod status;

use std::sync::Arc;
use std::time::Duration;

use sc_config::CorrelatorServiceConfig;
use sc_context_client::{ContextClient, ContextClientConfig};
use sc_correlator::{Correlator, CorrelatorConfig};
use sc_ingest_clients::{EventClient, TranscriptionClient};
use sc_llm_client::{LlmClient, LlmClientConfig};
use sc_runtime::health::health_router;
use sc_runtime::TaskTracker;
use sc_ws_foundation::client::{ClientRuntimeConfig, ResilientClient};
use sc_ws_foundation::{BackoffConfig, CircuitBreakerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::status::CorrelatorStatusProvider;

#[tokio::main]
async fn main() {
    let config = match CorrelatorServiceConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level, config.json_logs);
    info!(config = %config.redacted_summary(), "correlator-service starting");

    let timezone: chrono_tz::Tz = config.timezone.parse().expect("timezone was validated at config load");

    let correlator_cfg = CorrelatorConfig {
        context_window: Duration::from_secs(config.correlator.context_window_secs),
        analysis_interval: Duration::from_secs(config.correlator.analysis_interval_secs),
        analysis_cooldown: Duration::from_secs(config.correlator.analysis_cooldown_secs),
        correlation_window: Duration::from_secs(config.correlator.correlation_window_secs),
        retention_window: Duration::from_secs(config.correlator.retention_window_secs),
        max_buffer_size: config.correlator.max_buffer_size,
        native_emote_prefix: config.correlator.native_emote_prefix.clone(),
        timezone,
    };

    let circuit_breaker_cfg =
        CircuitBreakerConfig { failure_threshold: config.circuit_breaker.failure_threshold, recovery_timeout: Duration::from_secs(config.circuit_breaker.recovery_timeout_secs) };

    let llm_cfg = LlmClientConfig {
        api_url: config.lms.api_url.clone(),
        model: config.lms.model.clone(),
        rate_limit: config.lms.rate_limit,
        rate_window: Duration::from_secs(config.lms.rate_window_secs),
        rate_wait_ceiling: Duration::from_secs(5),
        request_timeout: Duration::from_secs(config.lms.timeout_secs),
        retry_backoff: BackoffConfig::default(),
        circuit_breaker: circuit_breaker_cfg,
    };
    let llm = Arc::new(LlmClient::new(llm_cfg).expect("failed to build llm client"));

    let context_cfg = ContextClientConfig {
        base_url: config.server.base_url.clone(),
        request_timeout: Duration::from_secs(15),
        auth_token: config.auth.token.clone(),
    };
    let context_client = Arc::new(ContextClient::new(context_cfg).expect("failed to build context client"));

    let correlator = Arc::new(Correlator::new(correlator_cfg, Arc::clone(&llm), Arc::clone(&context_client)));

    let runtime_cfg = ClientRuntimeConfig {
        backoff: BackoffConfig {
            base_secs: config.websocket.reconnect.reconnect_base_secs,
            cap_secs: config.websocket.reconnect.reconnect_cap_secs,
            max_attempts: config.websocket.reconnect.max_reconnect_attempts,
        },
        circuit_breaker: circuit_breaker_cfg,
        heartbeat_interval: Duration::from_secs(config.websocket.reconnect.heartbeat_interval_secs),
        max_missed_heartbeats: 3,
    };

    let transcription_client = TranscriptionClient::new(config.websocket.transcription_url.clone(), Arc::clone(&correlator));

    // Connect failure on the transcription channel is fatal: there is
    // nothing to correlate without it. The event channel is best-effort —
    // a failure there just means running chat-less until the reconnect
    // loop catches up.
    if let Err(err) = transcription_client.do_connect().await {
        error!(error = %err, "failed to connect to the transcription channel at startup");
        std::process::exit(1);
    }

    let event_client =
        EventClient::new(config.websocket.events_url.clone(), Arc::clone(&correlator), config.correlator.native_emote_prefix.clone());
    if let Err(err) = event_client.do_connect().await {
        warn!(error = %err, "failed to connect to the events channel at startup; continuing chat-less");
    }

    let transcription_runtime = Arc::new(sc_ws_foundation::ClientRuntime::new(transcription_client, runtime_cfg));
    let events_runtime = Arc::new(sc_ws_foundation::ClientRuntime::new(event_client, runtime_cfg));
    transcription_runtime.start();
    events_runtime.start();

    let status_provider = CorrelatorStatusProvider::new(Arc::clone(&correlator), Arc::clone(&transcription_runtime), Arc::clone(&events_runtime));

    let tasks = TaskTracker::new();
    tasks.spawn_tracked("periodic-analysis", {
        let correlator = Arc::clone(&correlator);
        async move {
            correlator.run_periodic_analysis().await;
        }
    });
    tasks.spawn_tracked("status-refresh", {
        let status_provider = Arc::clone(&status_provider);
        async move {
            status_provider.refresh_loop(Duration::from_secs(5)).await;
        }
    });

    let health_addr = format!("{}:{}", config.health.host, config.health.port);
    let health_listener = tokio::net::TcpListener::bind(&health_addr).await.expect("failed to bind health listener");
    info!(addr = %health_addr, "health endpoint listening");
    let health_app = health_router("correlator-service", status_provider);
    tasks.spawn_tracked("health-server", async move {
        if let Err(err) = axum::serve(health_listener, health_app).await {
            error!(error = %err, "health server stopped unexpectedly");
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received; stopping");

    transcription_runtime.shutdown(Duration::from_secs(5)).await;
    events_runtime.shutdown(Duration::from_secs(5)).await;
    tasks.shutdown(Duration::from_secs(5)).await;
    info!("correlator-service shut down gracefully");
}

fn init_logging(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::new(log_level);
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C"); },
        _ = terminate => { info!("received SIGTERM"); },
    }
}
