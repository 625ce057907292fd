//! HTTP client that POSTs assembled context records and GETs historical
//! contexts. The upstream context-storage service is an external
//! collaborator; its read-path JSON shapes beyond the fields this
//! workspace itself produces are treated as opaque.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use sc_protocol::ContextRecord;

use crate::error::ContextClientError;

#[derive(Debug, Clone)]
pub struct ContextClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub auth_token: Option<String>,
}

impl Default for ContextClientConfig {
    fn default() -> Self {
        ContextClientConfig {
            base_url: "http://localhost:7175".to_string(),
            request_timeout: Duration::from_secs(15),
            auth_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    contexts: Vec<ContextRecord>,
}

pub struct ContextClient {
    http: reqwest::Client,
    cfg: ContextClientConfig,
}

impl ContextClient {
    pub fn new(cfg: ContextClientConfig) -> Result<Self, ContextClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;
        Ok(ContextClient { http, cfg })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.cfg.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `POST /api/contexts`. Validates client-side first, refusing the call
    /// entirely rather than letting the server 422 on an
    /// obviously-incomplete record.
    pub async fn post_context(&self, record: &ContextRecord) -> Result<(), ContextClientError> {
        record.validate().map_err(ContextClientError::Validation)?;

        let url = format!("{}/api/contexts", self.cfg.base_url.trim_end_matches('/'));
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(record)
            .send()
            .await
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 422 {
            let body = response.text().await.unwrap_or_default();
            return Err(ContextClientError::Rejected(body));
        }
        if !status.is_success() {
            return Err(ContextClientError::Http { status: status.as_u16() });
        }
        Ok(())
    }

    /// `POST /api/contexts`, logging and dropping the error instead of
    /// propagating it: a sealed context window is not retried.
    pub async fn post_context_best_effort(&self, record: &ContextRecord) {
        if let Err(err) = self.post_context(record).await {
            warn!(error = %err, session = %record.session, "context POST failed; window dropped");
        }
    }

    /// `GET /api/contexts?limit=…&session=…`.
    pub async fn list_contexts(
        &self,
        limit: Option<u32>,
        session: Option<&str>,
    ) -> Result<Vec<ContextRecord>, ContextClientError> {
        let mut url = format!("{}/api/contexts", self.cfg.base_url.trim_end_matches('/'));
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(format!("limit={limit}"));
        }
        if let Some(session) = session {
            query.push(format!("session={}", urlencode(session)));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        self.get_contexts(&url).await
    }

    /// `GET /api/contexts/search?q=…&limit=…&session=…`.
    pub async fn search_contexts(
        &self,
        query: &str,
        limit: Option<u32>,
        session: Option<&str>,
    ) -> Result<Vec<ContextRecord>, ContextClientError> {
        let mut url = format!(
            "{}/api/contexts/search?q={}",
            self.cfg.base_url.trim_end_matches('/'),
            urlencode(query)
        );
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={limit}"));
        }
        if let Some(session) = session {
            url.push_str(&format!("&session={}", urlencode(session)));
        }
        self.get_contexts(&url).await
    }

    async fn get_contexts(&self, url: &str) -> Result<Vec<ContextRecord>, ContextClientError> {
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContextClientError::Http { status: status.as_u16() });
        }
        // Accept either a bare array or a `{"contexts": [...]}` envelope.
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ContextClientError::MalformedResponse(e.to_string()))?;
        if body.is_array() {
            serde_json::from_value(body).map_err(|e| ContextClientError::MalformedResponse(e.to_string()))
        } else {
            let wrapped: ListResponse =
                serde_json::from_value(body).map_err(|e| ContextClientError::MalformedResponse(e.to_string()))?;
            Ok(wrapped.contexts)
        }
    }

    /// `GET /api/contexts/stats?hours=…`. The upstream's stats shape is
    /// opaque JSON; callers pick fields out of the returned `Value`.
    pub async fn stats(&self, hours: u32) -> Result<serde_json::Value, ContextClientError> {
        let url = format!("{}/api/contexts/stats?hours={hours}", self.cfg.base_url.trim_end_matches('/'));
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContextClientError::Http { status: status.as_u16() });
        }
        response.json().await.map_err(|e| ContextClientError::MalformedResponse(e.to_string()))
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_record() -> ContextRecord {
        ContextRecord {
            started: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            ended: Utc.with_ymd_and_hms(2026, 1, 1, 0, 2, 1).unwrap(),
            session: "stream_2026_01_01".to_string(),
            transcript: "gg well played".to_string(),
            duration_secs: 121.0,
            chat_summary: None,
            interactions_summary: None,
            emotes_summary: None,
            patterns: None,
            sentiment: None,
            topics: None,
            rich_context: None,
        }
    }

    #[tokio::test]
    async fn post_context_rejects_invalid_record_without_a_request() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = ContextClient::new(ContextClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        let mut record = sample_record();
        record.transcript = String::new();

        let err = client.post_context(&record).await.unwrap_err();
        assert!(matches!(err, ContextClientError::Validation(_)));
    }

    #[tokio::test]
    async fn post_context_succeeds_on_201() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/contexts"))
            .respond_with(wiremock::ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = ContextClient::new(ContextClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        client.post_context(&sample_record()).await.unwrap();
    }

    #[tokio::test]
    async fn post_context_surfaces_422_as_rejected() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/contexts"))
            .respond_with(wiremock::ResponseTemplate::new(422).set_body_string("missing field"))
            .mount(&server)
            .await;

        let client = ContextClient::new(ContextClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        let err = client.post_context(&sample_record()).await.unwrap_err();
        assert!(matches!(err, ContextClientError::Rejected(_)));
    }

    #[tokio::test]
    async fn search_contexts_accepts_bare_array_response() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/contexts/search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(vec![sample_record()]))
            .mount(&server)
            .await;

        let client = ContextClient::new(ContextClientConfig { base_url: server.uri(), ..Default::default() }).unwrap();
        let results = client.search_contexts("gg", Some(5), None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session, "stream_2026_01_01");
    }
}
