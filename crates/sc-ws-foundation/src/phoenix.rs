//! The Phoenix-channel dialect shared by every ingest/egress client: a JSON
//! envelope plus a monotonic per-connection ref counter, with tolerance for
//! the legacy 5-element array wire form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// `{topic, event, payload, ref}`, the canonical object form of a Phoenix
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixEnvelope {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl PhoenixEnvelope {
    #[must_use]
    pub fn new(topic: impl Into<String>, event: impl Into<String>, payload: Value, reference: String) -> Self {
        PhoenixEnvelope { topic: topic.into(), event: event.into(), payload, reference: Some(reference) }
    }

    #[must_use]
    pub fn phx_join(topic: impl Into<String>, payload: Value, reference: String) -> Self {
        Self::new(topic, "phx_join", payload, reference)
    }

    #[must_use]
    pub fn phx_leave(topic: impl Into<String>, reference: String) -> Self {
        Self::new(topic, "phx_leave", Value::Object(serde_json::Map::new()), reference)
    }

    #[must_use]
    pub fn heartbeat(reference: String) -> Self {
        Self::new("phoenix", "heartbeat", Value::Object(serde_json::Map::new()), reference)
    }

    /// Parse either the canonical object form or the legacy
    /// `[join_ref, ref, topic, event, payload]` array form.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(envelope) = serde_json::from_str::<PhoenixEnvelope>(raw) {
            return Some(envelope);
        }
        let value: Value = serde_json::from_str(raw).ok()?;
        let array = value.as_array()?;
        if array.len() != 5 {
            return None;
        }
        let reference = array[1].as_str().map(str::to_string);
        let topic = array[2].as_str()?.to_string();
        let event = array[3].as_str()?.to_string();
        let payload = array[4].clone();
        Some(PhoenixEnvelope { topic, event, payload, reference })
    }
}

/// A monotonically increasing per-connection message ref, reset to 1 on
/// disconnect.
#[derive(Debug, Default)]
pub struct RefCounter(AtomicU64);

impl RefCounter {
    #[must_use]
    pub fn new() -> Self {
        RefCounter(AtomicU64::new(1))
    }

    /// The next ref, as a string (Phoenix refs are transmitted as strings).
    pub fn next(&self) -> String {
        self.0.fetch_add(1, Ordering::SeqCst).to_string()
    }

    pub fn reset(&self) {
        self.0.store(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_object_form() {
        let raw = r#"{"topic":"transcription:live","event":"phx_join","payload":{},"ref":"1"}"#;
        let envelope = PhoenixEnvelope::parse(raw).unwrap();
        assert_eq!(envelope.topic, "transcription:live");
        assert_eq!(envelope.event, "phx_join");
        assert_eq!(envelope.reference.as_deref(), Some("1"));
    }

    #[test]
    fn parses_legacy_array_form() {
        let raw = r#"["1","2","transcription:live","new_transcription",{"text":"hi"}]"#;
        let envelope = PhoenixEnvelope::parse(raw).unwrap();
        assert_eq!(envelope.topic, "transcription:live");
        assert_eq!(envelope.event, "new_transcription");
        assert_eq!(envelope.reference.as_deref(), Some("2"));
        assert_eq!(envelope.payload["text"], "hi");
    }

    #[test]
    fn ref_counter_resets_to_one() {
        let counter = RefCounter::new();
        assert_eq!(counter.next(), "1");
        assert_eq!(counter.next(), "2");
        counter.reset();
        assert_eq!(counter.next(), "1");
    }
}
