//! Ingest event types: transcription fragments, chat messages, emotes, and
//! viewer interactions.

use serde::{Deserialize, Serialize};

/// A decoded audio transcription fragment.
///
/// `timestamp_us` is epoch microseconds, already normalized via
/// [`crate::timestamp::normalize_micros`] by the ingest client that decoded
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub timestamp_us: i64,
    pub text: String,
    pub duration_secs: f64,
    pub confidence: Option<f64>,
}

/// A chat message, with its emote usage already extracted from fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp_ms: i64,
    pub username: String,
    pub message: String,
    pub emotes: Vec<String>,
    pub native_emotes: Vec<String>,
    pub is_subscriber: bool,
    pub is_moderator: bool,
}

/// A standalone emote usage event (distinct from inline chat emotes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoteEvent {
    pub timestamp_ms: i64,
    pub username: String,
    pub emote_name: String,
    pub emote_id: Option<String>,
}

/// The kind of discrete viewer interaction observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Follow,
    Subscription,
    GiftSubscription,
    Cheer,
    Raid,
}

impl InteractionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Follow => "follow",
            InteractionKind::Subscription => "subscription",
            InteractionKind::GiftSubscription => "gift_subscription",
            InteractionKind::Cheer => "cheer",
            InteractionKind::Raid => "raid",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete viewer interaction: follow, subscription, gift sub, cheer, or
/// raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerInteraction {
    pub timestamp_ms: i64,
    pub kind: InteractionKind,
    pub username: String,
    pub user_id: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_kind_round_trips_through_json() {
        for kind in [
            InteractionKind::Follow,
            InteractionKind::Subscription,
            InteractionKind::GiftSubscription,
            InteractionKind::Cheer,
            InteractionKind::Raid,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: InteractionKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}
