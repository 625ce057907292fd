mod query;
mod status;

use std::sync::Arc;
use std::time::Duration;

use sc_config::RagServiceConfig;
use sc_context_client::{ContextClient, ContextClientConfig};
use sc_llm_client::{LlmClient, LlmClientConfig};
use sc_rag::{ActivityClient, ActivityClientConfig, RagOrchestrator};
use sc_runtime::health::health_router;
use sc_runtime::TaskTracker;
use sc_vocabulary_client::{VocabularyCacheConfig, VocabularyClient, VocabularyClientConfig};
use sc_ws_foundation::{BackoffConfig, CircuitBreakerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::query::QueryState;
use crate::status::RagStatusProvider;

#[tokio::main]
async fn main() {
    let config = match RagServiceConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level, config.json_logs);
    info!(config = %config.redacted_summary(), "rag-service starting");

    let circuit_breaker_cfg = CircuitBreakerConfig::default();

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
    let llm = LlmClient::new(llm_cfg).expect("failed to build llm client");

    let context_cfg =
        ContextClientConfig { base_url: config.server.base_url.clone(), request_timeout: Duration::from_secs(15), auth_token: config.auth.token.clone() };
    let context = ContextClient::new(context_cfg).expect("failed to build context client");

    let activity_cfg = ActivityClientConfig { base_url: config.server.base_url.clone(), request_timeout: Duration::from_secs(10) };
    let activity = ActivityClient::new(activity_cfg).expect("failed to build activity client");

    let vocabulary_cfg = VocabularyClientConfig {
        base_url: config.server.base_url.clone(),
        request_timeout: Duration::from_secs(10),
        rate_limit: config.vocabulary.rate_limit,
        rate_window: Duration::from_secs(config.vocabulary.rate_window_secs),
        rate_wait_ceiling: Duration::from_secs(5),
        cache: VocabularyCacheConfig {
            max_entries: config.vocabulary.cache_max_entries,
            ttl: Duration::from_secs(config.vocabulary.cache_ttl_secs),
        },
        retry_backoff: BackoffConfig::default(),
    };
    let vocabulary = VocabularyClient::new(vocabulary_cfg).expect("failed to build vocabulary client");

    let orchestrator = Arc::new(RagOrchestrator::new(activity, context, vocabulary, llm));
    let status_provider = RagStatusProvider::new(Arc::clone(&orchestrator));

    let tasks = TaskTracker::new();

    let query_router = query::router(QueryState { orchestrator, status: Arc::clone(&status_provider) });
    let health_router = health_router("rag-service", status_provider);
    let app = axum::Router::new().merge(query_router).merge(health_router);

    let addr = format!("{}:{}", config.health.host, config.health.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind listener");
    info!(addr = %addr, "rag-service listening");

    tasks.spawn_tracked("http-server", async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "http server stopped unexpectedly");
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received; stopping");
    tasks.shutdown(Duration::from_secs(5)).await;
    info!("rag-service shut down gracefully");
}

fn init_logging(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::new(log_level);
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

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
