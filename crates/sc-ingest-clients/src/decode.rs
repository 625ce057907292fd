//! Wire-payload decoding shared by the transcription and event clients:
//! the `data` envelopes, fragment/badge extraction, and timestamp-unit
//! juggling — chat timestamps are ISO 8601 or numeric, and numeric values
//! at or below the plausible-millisecond floor are seconds, not
//! milliseconds.

use sc_protocol::timestamp::{normalize_chat_millis, parse_iso8601_micros};
use sc_protocol::{ChatMessage, InteractionKind, ViewerInteraction};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ChatData {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: Value,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

#[derive(Debug, Deserialize)]
pub struct Fragment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Badge {
    #[serde(default)]
    pub set_id: String,
}

/// A generic `data` payload shared by `follower`, `subscription`,
/// `gift_subscription`, `cheer`, and `raid` events. Whatever fields aren't
/// named here (the kind-specific ones — tier, amount, months, …) fall into
/// `details` via `#[serde(flatten)]` and ride along on `ViewerInteraction`.
#[derive(Debug, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

/// Decode a numeric-or-string timestamp into epoch milliseconds. Strings
/// are parsed as ISO 8601; numeric values at or below the plausible-millis
/// floor are treated as seconds and scaled up.
#[must_use]
pub fn decode_timestamp_ms(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_iso8601_micros(s).map(|micros| micros / 1000),
        Value::Number(n) => n.as_i64().map(normalize_chat_millis),
        _ => None,
    }
}

/// Decode a numeric-or-string timestamp into epoch microseconds. The
/// transcription channel only ever sends ISO 8601 strings, but a numeric
/// fallback costs nothing and matches how every other ingest path treats
/// the same ambiguity.
#[must_use]
pub fn decode_timestamp_us(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_iso8601_micros(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Build a [`ChatMessage`] from a decoded `chat_message` payload, splitting
/// fragment emotes into the ordinary and native-prefixed lists and badges
/// into the subscriber/moderator flags.
#[must_use]
pub fn build_chat_message(data: ChatData, native_emote_prefix: &str, now_ms: i64) -> ChatMessage {
    let timestamp_ms = decode_timestamp_ms(&data.timestamp).unwrap_or(now_ms);

    let mut emotes = Vec::new();
    let mut native_emotes = Vec::new();
    for fragment in &data.fragments {
        if fragment.kind == "emote" && !fragment.text.is_empty() {
            emotes.push(fragment.text.clone());
            if !native_emote_prefix.is_empty() && fragment.text.starts_with(native_emote_prefix) {
                native_emotes.push(fragment.text.clone());
            }
        }
    }

    let is_subscriber = data.badges.iter().any(|b| b.set_id == "subscriber" || b.set_id == "founder");
    let is_moderator = data.badges.iter().any(|b| b.set_id == "moderator" || b.set_id == "broadcaster");

    ChatMessage {
        timestamp_ms,
        username: data.user_name,
        message: data.message,
        emotes,
        native_emotes,
        is_subscriber,
        is_moderator,
    }
}

/// Build a [`ViewerInteraction`] from a decoded interaction payload and the
/// event name it arrived under.
#[must_use]
pub fn build_interaction(data: InteractionData, kind: InteractionKind, now_ms: i64) -> ViewerInteraction {
    let timestamp_ms = data.timestamp.as_ref().and_then(decode_timestamp_ms).unwrap_or(now_ms);
    let username = data.user_name.or(data.username).unwrap_or_default();
    let user_id = data.user_id.unwrap_or_default();

    ViewerInteraction { timestamp_ms, kind, username, user_id, details: data.details }
}
