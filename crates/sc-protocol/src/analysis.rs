//! The LLM-derived analysis schema: flexible patterns, stream dynamics, and
//! the top-level `AnalysisResult` produced once per periodic analysis cycle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Scalar and free-form pattern block. Adopted in favor of the older fixed
/// categorical schema: scalars in `[0, 1]` plus an open `content_focus` tag
/// list and an open `mood_indicators` map, so the model isn't forced into a
/// fixed vocabulary of moods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexiblePatterns {
    pub energy_level: f64,
    pub engagement_depth: f64,
    pub community_sync: f64,
    #[serde(default)]
    pub content_focus: Vec<String>,
    #[serde(default)]
    pub mood_indicators: HashMap<String, f64>,
    pub temporal_flow: String,
}

/// Enumerated trend block describing how patterns are moving, not just
/// their current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDynamics {
    pub energy_trajectory: String,
    pub engagement_trend: String,
    pub community_trend: String,
    pub content_evolution: String,
    pub overall_momentum: String,
}

/// Overall sentiment bucket for a context window or analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Parse a loosely-cased sentiment string, returning `None` for
    /// anything outside the four recognized values (caller drops the field
    /// rather than failing the whole record, per the Context Client's
    /// validation policy).
    #[must_use]
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "mixed" => Some(Sentiment::Mixed),
            _ => None,
        }
    }
}

/// The full result of one LLM analysis cycle over buffered transcription and
/// chat context, with the correlator's own metrics attached afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub timestamp_us: i64,
    pub patterns: FlexiblePatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<StreamDynamics>,
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_trajectory: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub context: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_momentum: Option<serde_json::Value>,
    pub transcription_context: String,
    pub chat_context: String,
    pub chat_velocity: f64,
    #[serde(default)]
    pub emote_frequency: HashMap<String, u32>,
    #[serde(default)]
    pub native_emote_frequency: HashMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_parse_loose_accepts_all_four_case_insensitively() {
        assert_eq!(Sentiment::parse_loose("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse_loose("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse_loose("neutral"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse_loose("Mixed"), Some(Sentiment::Mixed));
        assert_eq!(Sentiment::parse_loose("ecstatic"), None);
    }

    #[test]
    fn native_emote_frequency_is_pointwise_subset_of_emote_frequency() {
        let mut emote_frequency = HashMap::new();
        emote_frequency.insert("Kappa".to_string(), 5);
        emote_frequency.insert("PogChamp".to_string(), 2);
        let mut native = HashMap::new();
        native.insert("Kappa".to_string(), 3);

        for (k, v) in &native {
            assert!(emote_frequency.get(k).copied().unwrap_or(0) >= *v);
        }
    }
}
