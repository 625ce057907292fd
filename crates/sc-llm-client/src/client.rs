//! HTTP client to an OpenAI-compatible chat-completions endpoint, shared by
//! the correlator's periodic analysis cycle and the RAG orchestrator's
//! structured-answer generation.

use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use governor::{Quota, RateLimiter};
use tracing::{debug, warn};

use sc_ws_foundation::backoff::delay_for_attempt;
use sc_ws_foundation::circuit_breaker::CircuitBreaker;

use crate::analysis_payload::AnalysisPayload;
use crate::config::{LlmClientConfig, SamplingParams};
use crate::error::LlmClientError;
use crate::prompts::{analysis_user_message, ANALYSIS_SYSTEM_PROMPT, RAG_SCHEMA_INSTRUCTIONS};
use crate::wire::{ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse, StructuredAnswerPayload};
use sc_protocol::ResponseType;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A structured answer from `generate_response`, with a `from_plain_content`
/// fallback for models that reply with bare prose instead of the fixed
/// schema.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub confidence: f64,
    pub reasoning: String,
    pub response_type: ResponseType,
    pub suggestions: Option<Vec<String>>,
}

impl GeneratedAnswer {
    #[must_use]
    pub fn from_plain_content(content: String) -> Self {
        GeneratedAnswer {
            answer: content,
            confidence: 0.5,
            reasoning: "model replied without the structured schema".to_string(),
            response_type: ResponseType::Fallback,
            suggestions: None,
        }
    }
}

/// HTTP client to an OpenAI-compatible `/v1/chat/completions` endpoint.
/// Both `analyze` and `generate_response` contend for the same one
/// `rate_limiter` and `circuit`, keyed on the client instance rather than
/// per entry point.
pub struct LlmClient {
    http: reqwest::Client,
    cfg: LlmClientConfig,
    rate_limiter: DirectRateLimiter,
    circuit: Mutex<CircuitBreaker>,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self, LlmClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| LlmClientError::Transport(e.to_string()))?;

        let per_request = cfg.rate_window.as_secs_f64() / f64::from(cfg.rate_limit.max(1));
        let quota = Quota::with_period(Duration::from_secs_f64(per_request))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).unwrap()))
            .allow_burst(NonZeroU32::new(cfg.rate_limit.max(1)).unwrap());
        let rate_limiter = RateLimiter::direct(quota);

        let circuit = Mutex::new(CircuitBreaker::new(cfg.circuit_breaker));

        Ok(LlmClient { http, cfg, rate_limiter, circuit })
    }

    /// The periodic analysis cycle's entry point. Every failure here is
    /// local: this never returns `Err`, only `None` on any transport,
    /// circuit, rate-limit, or malformed-JSON failure, logging along the
    /// way so the caller can simply skip the cycle.
    pub async fn analyze(&self, transcription_context: &str, chat_context: &str) -> Option<AnalysisPayload> {
        match self.try_analyze(transcription_context, chat_context).await {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(error = %err, "llm analysis failed; skipping this cycle");
                None
            }
        }
    }

    async fn try_analyze(
        &self,
        transcription_context: &str,
        chat_context: &str,
    ) -> Result<AnalysisPayload, LlmClientError> {
        let params = SamplingParams::analysis_defaults();
        let messages = vec![
            ChatCompletionMessage { role: "system", content: ANALYSIS_SYSTEM_PROMPT.to_string() },
            ChatCompletionMessage {
                role: "user",
                content: analysis_user_message(transcription_context, chat_context),
            },
        ];
        let content = self.call(messages, params).await?;
        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| LlmClientError::MalformedResponse(e.to_string()))
    }

    /// The RAG orchestrator's entry point: returns `Err` (rather than
    /// swallowing) so the caller can apply its own deterministic fallback,
    /// distinct from the analysis path's "just skip".
    pub async fn generate_response(&self, user_prompt: &str) -> Result<GeneratedAnswer, LlmClientError> {
        let params = SamplingParams::rag_defaults();
        let messages = vec![
            ChatCompletionMessage {
                role: "system",
                content: format!(
                    "You are a helpful assistant answering a streamer's question about their own channel.{RAG_SCHEMA_INSTRUCTIONS}"
                ),
            },
            ChatCompletionMessage { role: "user", content: user_prompt.to_string() },
        ];
        let content = self.call(messages, params).await?;

        match serde_json::from_str::<StructuredAnswerPayload>(strip_code_fence(&content)) {
            Ok(payload) => Ok(GeneratedAnswer {
                answer: payload.answer,
                confidence: payload.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
                reasoning: payload.reasoning.unwrap_or_default(),
                response_type: payload.response_type.unwrap_or(ResponseType::Fallback),
                suggestions: payload.suggestions,
            }),
            Err(_) => Ok(GeneratedAnswer::from_plain_content(content)),
        }
    }

    /// Rate-limit, circuit-break, retry-on-5xx, and issue one
    /// chat-completions call, returning the raw message content string.
    async fn call(
        &self,
        messages: Vec<ChatCompletionMessage>,
        params: SamplingParams,
    ) -> Result<String, LlmClientError> {
        {
            let circuit = self.circuit.lock().unwrap();
            if circuit.is_open(Instant::now()) {
                return Err(LlmClientError::CircuitOpen {
                    retry_after_secs: self.cfg.circuit_breaker.recovery_timeout.as_secs(),
                });
            }
        }

        match tokio::time::timeout(self.cfg.rate_wait_ceiling, self.rate_limiter.until_ready()).await {
            Ok(()) => {}
            Err(_) => return Err(LlmClientError::RateLimited),
        }

        let request = ChatCompletionRequest {
            model: self.cfg.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
        };

        let url = format!("{}/chat/completions", self.cfg.api_url.trim_end_matches('/'));
        let mut attempt = 0u32;

        loop {
            let outcome = self.send_once(&url, &request).await;
            match outcome {
                Ok(content) => {
                    self.circuit.lock().unwrap().record_success();
                    return Ok(content);
                }
                Err(LlmClientError::Http { status }) if (500..600).contains(&status) && attempt < self.cfg.retry_backoff.max_attempts => {
                    attempt += 1;
                    let delay = delay_for_attempt(&self.cfg.retry_backoff, attempt);
                    debug!(attempt, delay_secs = delay.as_secs_f64(), status, "retrying after 5xx");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    self.circuit.lock().unwrap().record_failure(Instant::now());
                    return Err(err);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, request: &ChatCompletionRequest) -> Result<String, LlmClientError> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmClientError::Timeout { timeout_secs: self.cfg.request_timeout.as_secs() }
                } else {
                    LlmClientError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmClientError::Http { status: status.as_u16() });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmClientError::MalformedResponse("no choices[0].message.content in response".to_string()))
    }
}

/// Strip a leading/trailing ```json fence some models add despite being
/// told not to, so the JSON parse underneath doesn't need to care.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed.strip_prefix("```json").or_else(|| trimmed.strip_prefix("```")).unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_removes_json_fence() {
        let wrapped = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"a\":1}");
    }

    #[test]
    fn strip_code_fence_passes_through_bare_json() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn generate_response_falls_back_to_plain_content_wrapping() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "just a plain sentence, no schema"}}]
            })))
            .mount(&server)
            .await;

        let mut cfg = LlmClientConfig::default();
        cfg.api_url = server.uri();
        let client = LlmClient::new(cfg).unwrap();

        let answer = client.generate_response("what's up?").await.unwrap();
        assert_eq!(answer.answer, "just a plain sentence, no schema");
        assert_eq!(answer.confidence, 0.5);
        assert_eq!(answer.response_type, ResponseType::Fallback);
    }

    #[tokio::test]
    async fn analyze_returns_none_on_malformed_json() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "not json at all"}}]
            })))
            .mount(&server)
            .await;

        let mut cfg = LlmClientConfig::default();
        cfg.api_url = server.uri();
        let client = LlmClient::new(cfg).unwrap();

        let result = client.analyze("transcript", "chat").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn circuit_open_fails_fast_without_a_request() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = LlmClientConfig::default();
        cfg.api_url = server.uri();
        cfg.circuit_breaker.failure_threshold = 1;
        cfg.retry_backoff.max_attempts = 0;
        let client = LlmClient::new(cfg).unwrap();

        let first = client.generate_response("q").await;
        assert!(first.is_err());
        let second = client.generate_response("q").await;
        assert!(matches!(second, Err(LlmClientError::CircuitOpen { .. })));
    }
}
