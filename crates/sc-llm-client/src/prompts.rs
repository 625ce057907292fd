//! System prompts that pin the model's reply to a single parseable JSON
//! object, for each of the two entry points.

/// Fixes the response to a single JSON object matching `AnalysisResult`'s
/// pattern/dynamics/sentiment/topic fields (the correlator attaches its own
/// metrics afterward, so the model is not asked to produce them).
pub(crate) const ANALYSIS_SYSTEM_PROMPT: &str = r#"You analyze a live stream's recent transcript and chat activity.
Respond with exactly one JSON object and nothing else, matching this shape:
{
  "patterns": {
    "energy_level": <float 0-1>,
    "engagement_depth": <float 0-1>,
    "community_sync": <float 0-1>,
    "content_focus": [<string>, ...],
    "mood_indicators": {<string>: <float 0-1>, ...},
    "temporal_flow": <string>
  },
  "dynamics": {
    "energy_trajectory": <string>,
    "engagement_trend": <string>,
    "community_trend": <string>,
    "content_evolution": <string>,
    "overall_momentum": <string>
  },
  "sentiment": "positive" | "negative" | "neutral" | "mixed",
  "sentiment_trajectory": <string or null>,
  "topics": [<string>, ...],
  "context": <string, a short prose summary>,
  "suggested_actions": [<string>, ...],
  "stream_momentum": <any JSON value describing overall momentum, or null>
}
Do not wrap the JSON in markdown fences. Do not include any prose outside the object."#;

/// Builds the user message for one analysis cycle.
pub(crate) fn analysis_user_message(transcription_context: &str, chat_context: &str) -> String {
    format!(
        "Transcript:\n{transcription_context}\n\nChat and interaction activity:\n{chat_context}"
    )
}

/// Appended to a RAG caller's prompt to fix the structured-answer schema.
pub(crate) const RAG_SCHEMA_INSTRUCTIONS: &str = r#"
Respond with exactly one JSON object and nothing else, matching this shape:
{
  "answer": <string>,
  "confidence": <float 0-1>,
  "reasoning": <string, brief>,
  "response_type": "factual" | "creative" | "clarification" | "insufficient_data" | "fallback",
  "suggestions": [<string>, ...] (optional)
}
Do not wrap the JSON in markdown fences. Do not include any prose outside the object."#;
