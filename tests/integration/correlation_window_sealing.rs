//! End-to-end exercise of the correlator against real HTTP collaborators
//! (mocked with `wiremock`): feed a correlated chat burst and a
//! window-aging transcription pair, and confirm the POST body the context
//! client actually sends matches the expected correlation and sealing
//! behavior.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sc_context_client::{ContextClient, ContextClientConfig};
use sc_correlator::{Correlator, CorrelatorConfig};
use sc_llm_client::{LlmClient, LlmClientConfig};
use sc_protocol::{ChatMessage, Transcription};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analysis_response_body() -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": {
                "content": serde_json::json!({
                    "patterns": {
                        "energy_level": 0.7,
                        "engagement_depth": 0.6,
                        "community_sync": 0.5,
                        "content_focus": ["gameplay"],
                        "mood_indicators": {"hype": 0.8},
                        "temporal_flow": "building"
                    },
                    "sentiment": "positive",
                    "topics": ["clutch play"],
                    "context": "the streamer landed a clutch play and chat reacted",
                    "suggested_actions": []
                }).to_string()
            }
        }]
    })
}

#[tokio::test]
async fn sealed_window_posts_the_expected_context_record() {
    let context_server = MockServer::start().await;
    let llm_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/contexts"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&context_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_response_body()))
        .mount(&llm_server)
        .await;

    let context_client = Arc::new(
        ContextClient::new(ContextClientConfig { base_url: context_server.uri(), ..Default::default() }).unwrap(),
    );
    let llm_client = Arc::new(LlmClient::new(LlmClientConfig { api_url: llm_server.uri(), ..Default::default() }).unwrap());

    let correlator = Correlator::new(CorrelatorConfig::default(), Arc::clone(&llm_client), Arc::clone(&context_client));

    let t0 = Utc.with_ymd_and_hms(2026, 7, 27, 18, 0, 0).unwrap();
    let t0_us = t0.timestamp_micros();

    // Scenario 1's correlation burst: one transcription, three chats within
    // and beyond the 10s correlation window.
    correlator
        .add_transcription(Transcription { timestamp_us: t0_us, text: "gg".to_string(), duration_secs: 1.0, confidence: None })
        .await;
    correlator
        .add_chat(ChatMessage {
            timestamp_ms: t0_us / 1000 + 5_000,
            username: "viewerA".to_string(),
            message: "nice".to_string(),
            emotes: vec!["Kappa".to_string()],
            native_emotes: vec![],
            is_subscriber: false,
            is_moderator: false,
        })
        .await;
    correlator
        .add_chat(ChatMessage {
            timestamp_ms: t0_us / 1000 + 7_000,
            username: "viewerB".to_string(),
            message: "gg".to_string(),
            emotes: vec![],
            native_emotes: vec![],
            is_subscriber: false,
            is_moderator: false,
        })
        .await;
    correlator
        .add_chat(ChatMessage {
            timestamp_ms: t0_us / 1000 + 20_000,
            username: "viewerC".to_string(),
            message: "later".to_string(),
            emotes: vec![],
            native_emotes: vec![],
            is_subscriber: false,
            is_moderator: false,
        })
        .await;

    let analysis = correlator.analyze(true).await.expect("llm mock should produce a result");
    assert!(analysis.chat_context.contains(r#"After "gg": 2 messages"#));
    assert!((analysis.chat_velocity - 12.0).abs() < 0.5, "expected ~12 msg/min, got {}", analysis.chat_velocity);

    // Second transcription 121s later (stream time) seals the window.
    correlator
        .add_transcription(Transcription {
            timestamp_us: t0_us + 121_000_000,
            text: "well played everyone".to_string(),
            duration_secs: 1.5,
            confidence: Some(0.9),
        })
        .await;

    // Sealing is synchronous inside add_transcription; the POST has
    // already landed by the time control returns here.
    let requests = context_server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST" && r.url.path() == "/api/contexts").expect("context POST was sent");
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();

    assert_eq!(body["transcript"], "gg well played everyone");
    assert!((body["duration_secs"].as_f64().unwrap() - 121.0).abs() < 1e-6);
    assert_eq!(body["session"].as_str().unwrap(), "stream_2026_07_27");
    assert_eq!(body["sentiment"], "positive");

    // The window reset: a fresh transcription starts a brand-new window.
    let status = correlator.status().await;
    assert!(status.context_window_age_secs.is_none() || status.context_window_age_secs.unwrap() < 121.0);
}
