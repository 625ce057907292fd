//! Per-analysis metrics computed directly over the buffers: chat velocity,
//! emote frequency, and engagement density.

use std::collections::HashMap;

use sc_protocol::{ChatMessage, EmoteEvent, InteractionKind};

/// Messages per minute across the buffered chat window. Zero when there
/// are fewer than two messages, or when the head-to-tail span is under 6 s,
/// since the rate is not meaningful at that scale.
#[must_use]
pub fn chat_velocity(chat: &[ChatMessage]) -> f64 {
    if chat.len() < 2 {
        return 0.0;
    }
    let span_ms = chat.last().unwrap().timestamp_ms - chat.first().unwrap().timestamp_ms;
    let span_secs = span_ms as f64 / 1000.0;
    if span_secs < 6.0 {
        return 0.0;
    }
    let minutes = span_secs / 60.0;
    chat.len() as f64 / minutes
}

/// Top-10 emote counts across both inline chat emotes and standalone emote
/// events.
#[must_use]
pub fn emote_frequency(chat: &[ChatMessage], emotes: &[EmoteEvent]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for message in chat {
        for emote in &message.emotes {
            *counts.entry(emote.clone()).or_insert(0) += 1;
        }
    }
    for event in emotes {
        *counts.entry(event.emote_name.clone()).or_insert(0) += 1;
    }
    top_n(counts, 10)
}

/// The subset of `emote_frequency` restricted to names carrying the
/// configured channel's native prefix.
#[must_use]
pub fn native_emote_frequency(chat: &[ChatMessage], emotes: &[EmoteEvent], prefix: &str) -> HashMap<String, u32> {
    if prefix.is_empty() {
        return HashMap::new();
    }
    let mut counts: HashMap<String, u32> = HashMap::new();
    for message in chat {
        for emote in &message.native_emotes {
            *counts.entry(emote.clone()).or_insert(0) += 1;
        }
    }
    for event in emotes {
        if event.emote_name.starts_with(prefix) {
            *counts.entry(event.emote_name.clone()).or_insert(0) += 1;
        }
    }
    top_n(counts, 10)
}

fn top_n(counts: HashMap<String, u32>, n: usize) -> HashMap<String, u32> {
    let mut pairs: Vec<(String, u32)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.into_iter().take(n).collect()
}

/// Interaction counts keyed by `InteractionKind::as_str`.
#[must_use]
pub fn interaction_counts(kinds: &[InteractionKind]) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for kind in kinds {
        *counts.entry(kind.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Interactions per minute of the containing context window.
#[must_use]
pub fn engagement_density(interaction_count: usize, context_window_seconds: f64) -> f64 {
    if context_window_seconds <= 0.0 {
        return 0.0;
    }
    interaction_count as f64 / (context_window_seconds / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_at(timestamp_ms: i64, emotes: Vec<&str>) -> ChatMessage {
        ChatMessage {
            timestamp_ms,
            username: "viewer".to_string(),
            message: "hi".to_string(),
            emotes: emotes.iter().map(|s| s.to_string()).collect(),
            native_emotes: vec![],
            is_subscriber: false,
            is_moderator: false,
        }
    }

    #[test]
    fn chat_velocity_single_message_is_zero() {
        assert_eq!(chat_velocity(&[chat_at(0, vec![])]), 0.0);
    }

    #[test]
    fn chat_velocity_under_six_second_span_is_zero() {
        let chat = vec![chat_at(0, vec![]), chat_at(5_000, vec![])];
        assert_eq!(chat_velocity(&chat), 0.0);
    }

    #[test]
    fn chat_velocity_matches_scenario_1() {
        // Three messages over a 15 s span should be ~12.0 msg/min.
        let chat = vec![chat_at(5_000, vec![]), chat_at(7_000, vec![]), chat_at(20_000, vec![])];
        let velocity = chat_velocity(&chat);
        assert!((velocity - 12.0).abs() < 1e-6, "got {velocity}");
    }

    #[test]
    fn emote_frequency_takes_top_ten() {
        let chat: Vec<ChatMessage> = (0..15)
            .map(|i| chat_at(i, vec!["Kappa"]))
            .collect();
        let freq = emote_frequency(&chat, &[]);
        assert_eq!(freq.get("Kappa"), Some(&15));
    }

    #[test]
    fn native_emote_frequency_is_empty_when_prefix_unset() {
        let chat = vec![chat_at(0, vec!["Kappa"])];
        assert!(native_emote_frequency(&chat, &[], "").is_empty());
    }
}
