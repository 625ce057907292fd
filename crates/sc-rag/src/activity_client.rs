//! Read-only HTTP client for the activity/stream-status endpoints. Scoped
//! to `sc-rag` rather than split into its own crate: unlike the context and
//! vocabulary interfaces, nothing else in the workspace consumes
//! activity/stream-status data.

use std::time::Duration;

use serde::Deserialize;

use crate::error::RagError;

#[derive(Debug, Clone)]
pub struct ActivityClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ActivityClientConfig {
    fn default() -> Self {
        ActivityClientConfig { base_url: "http://localhost:7175".to_string(), request_timeout: Duration::from_secs(10) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityStats {
    #[serde(default)]
    pub total_events: u64,
    #[serde(default)]
    pub unique_users: u64,
    #[serde(default)]
    pub chat_messages: u64,
    #[serde(default)]
    pub follows: u64,
    #[serde(default)]
    pub subscriptions: u64,
    #[serde(default)]
    pub cheers: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamStatus {
    pub is_live: bool,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub stream_title: Option<String>,
    #[serde(default)]
    pub viewer_count: Option<u64>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    stats: ActivityStats,
}

#[derive(Deserialize)]
struct EventsEnvelope {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

pub struct ActivityClient {
    http: reqwest::Client,
    cfg: ActivityClientConfig,
}

impl ActivityClient {
    pub fn new(cfg: ActivityClientConfig) -> Result<Self, RagError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| RagError::Transport { source_name: "activity".to_string(), message: e.to_string() })?;
        Ok(ActivityClient { http, cfg })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, RagError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RagError::Transport { source_name: "activity".to_string(), message: e.to_string() })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RagError::Http { source_name: "activity".to_string(), status: status.as_u16() });
        }
        response
            .json()
            .await
            .map_err(|e| RagError::MalformedResponse { source_name: "activity".to_string(), message: e.to_string() })
    }

    /// `GET /api/activity/events?event_type=…`.
    pub async fn events(&self, event_type: Option<&str>) -> Result<Vec<serde_json::Value>, RagError> {
        let mut url = format!("{}/api/activity/events", self.cfg.base_url.trim_end_matches('/'));
        if let Some(event_type) = event_type {
            url.push_str(&format!("?event_type={event_type}"));
        }
        let body = self.get_json(&url).await?;
        let envelope: DataEnvelope<EventsEnvelope> = serde_json::from_value(body)
            .map_err(|e| RagError::MalformedResponse { source_name: "activity".to_string(), message: e.to_string() })?;
        Ok(envelope.data.events)
    }

    /// `GET /api/activity/stats`.
    pub async fn stats(&self) -> Result<ActivityStats, RagError> {
        let url = format!("{}/api/activity/stats", self.cfg.base_url.trim_end_matches('/'));
        let body = self.get_json(&url).await?;
        let envelope: DataEnvelope<StatsEnvelope> = serde_json::from_value(body)
            .map_err(|e| RagError::MalformedResponse { source_name: "activity".to_string(), message: e.to_string() })?;
        Ok(envelope.data.stats)
    }

    /// `GET /api/twitch/status`.
    pub async fn stream_status(&self) -> Result<StreamStatus, RagError> {
        let url = format!("{}/api/twitch/status", self.cfg.base_url.trim_end_matches('/'));
        let body = self.get_json(&url).await?;
        let envelope: DataEnvelope<StreamStatus> = serde_json::from_value(body)
            .map_err(|e| RagError::MalformedResponse { source_name: "activity".to_string(), message: e.to_string() })?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn stats_unwraps_the_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/activity/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"stats": {"total_events": 42, "chat_messages": 10}}
            })))
            .mount(&server)
            .await;

        let client = ActivityClient::new(ActivityClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total_events, 42);
        assert_eq!(stats.chat_messages, 10);
    }

    #[tokio::test]
    async fn stream_status_reports_offline_as_a_normal_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/twitch/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"is_live": false}
            })))
            .mount(&server)
            .await;

        let client = ActivityClient::new(ActivityClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        let status = client.stream_status().await.unwrap();
        assert!(!status.is_live);
    }
}
