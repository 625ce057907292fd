//! The sealed `ContextWindow` record posted to the Context HTTP interface.
//!
//! `ContextRecord` is the legacy flat POST shape the Context Client sends;
//! `RichContextData` is the nested analytical detail embedded in its
//! `rich_context` field, built by the correlator when it seals a window.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, FlexiblePatterns, Sentiment};
use crate::events::{ChatMessage, EmoteEvent, ViewerInteraction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub timestamp_us: i64,
    pub text: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingPatterns {
    pub words_per_minute: f64,
    pub avg_pause_secs: f64,
    pub max_pause_secs: f64,
    pub avg_fragment_duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_fragment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalData {
    pub window_start_us: i64,
    pub window_end_us: i64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    pub transcript: String,
    pub fragments: Vec<TranscriptFragment>,
    pub confidence_scores: Vec<Option<f64>>,
    pub speaking_patterns: Option<SpeakingPatterns>,
    pub content_metrics: ContentMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMetrics {
    pub chat_velocity: f64,
    pub top_emotes: HashMap<String, u32>,
    pub engagement_density: f64,
    pub interaction_counts: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityData {
    pub chat_messages: Vec<ChatMessage>,
    pub emote_usage: Vec<EmoteEvent>,
    pub viewer_interactions: Vec<ViewerInteraction>,
    pub community_metrics: CommunityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEnergy {
    pub chat_count: usize,
    pub fragment_count: usize,
    pub energy_indicator: f64,
}

/// `"increasing"`, `"decreasing"`, or `"stable"`; fewer than three segments
/// yields `"stable"` with no segment detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalTrend {
    pub trend: String,
    pub segments: Vec<SegmentEnergy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechChatCorrelation {
    pub fragment_index: usize,
    pub correlated_count: usize,
    pub avg_chat_delay_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationData {
    pub speech_chat_correlation: Vec<SpeechChatCorrelation>,
    pub temporal_trend: TemporalTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichContextData {
    pub temporal: TemporalData,
    pub content: ContentData,
    pub community: CommunityData,
    pub correlation: CorrelationData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub model_metadata: serde_json::Value,
}

/// The legacy flat record shape POSTed to `/api/contexts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub started: chrono::DateTime<chrono::Utc>,
    pub ended: chrono::DateTime<chrono::Utc>,
    pub session: String,
    pub transcript: String,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotes_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<FlexiblePatterns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_context: Option<RichContextData>,
}

impl ContextRecord {
    /// Client-side validation matching the Context Client's required-field
    /// check: refuses the operation (rather than letting the server 422)
    /// when any of the always-required fields are empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.session.trim().is_empty() {
            return Err("session must not be empty".to_string());
        }
        if self.transcript.trim().is_empty() {
            return Err("transcript must not be empty".to_string());
        }
        if self.ended < self.started {
            return Err("ended must not precede started".to_string());
        }
        Ok(())
    }
}
