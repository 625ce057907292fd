//! The subset of `AnalysisResult` the model itself produces; the correlator
//! fills in `timestamp_us`, the context strings, and its own metrics.

use serde::Deserialize;

use sc_protocol::{FlexiblePatterns, Sentiment, StreamDynamics};

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisPayload {
    pub patterns: FlexiblePatterns,
    #[serde(default)]
    pub dynamics: Option<StreamDynamics>,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub sentiment_trajectory: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub stream_momentum: Option<serde_json::Value>,
}
