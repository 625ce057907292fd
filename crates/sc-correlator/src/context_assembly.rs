//! Builds the textual context blocks fed to the LLM Client and embedded in
//! sealed context windows: transcription context, correlated chat context,
//! and interaction context.

use sc_protocol::{ChatMessage, InteractionKind, Transcription, ViewerInteraction};
use std::collections::HashMap;

/// Space-joined text of every buffered transcription fragment, in order.
#[must_use]
pub fn transcription_context(transcriptions: &[Transcription]) -> String {
    transcriptions.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// One transcription's chat correlation window and its rendered summary.
pub struct ChatCorrelation {
    pub fragment_index: usize,
    pub matched: Vec<ChatMessage>,
}

/// For each transcription, select chat messages within `[t.ts, t.ts +
/// correlation_window]`, both compared in microseconds (chat timestamps
/// are converted from milliseconds at the boundary).
#[must_use]
pub fn correlate(transcriptions: &[Transcription], chat: &[ChatMessage], correlation_window_us: i64) -> Vec<ChatCorrelation> {
    transcriptions
        .iter()
        .enumerate()
        .map(|(index, t)| {
            let start = t.timestamp_us;
            let end = t.timestamp_us + correlation_window_us;
            let matched = chat
                .iter()
                .filter(|c| {
                    let ts_us = c.timestamp_ms * 1000;
                    ts_us >= start && ts_us <= end
                })
                .cloned()
                .collect();
            ChatCorrelation { fragment_index: index, matched }
        })
        .collect()
}

/// Render one correlation group's summary: `"N messages (emotes: X×k, Y×k2,
/// chat: m1 / m2 / m3)"`.
#[must_use]
fn summarize_group(messages: &[ChatMessage]) -> String {
    let mut emote_counts: HashMap<&str, u32> = HashMap::new();
    for message in messages {
        for emote in &message.emotes {
            *emote_counts.entry(emote.as_str()).or_insert(0) += 1;
        }
    }
    let mut emote_pairs: Vec<(&str, u32)> = emote_counts.into_iter().collect();
    emote_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_emotes: Vec<String> = emote_pairs.into_iter().take(3).map(|(name, count)| format!("{name}x{count}")).collect();

    let sample_messages: Vec<&str> = messages.iter().take(3).map(|m| m.message.as_str()).collect();

    if top_emotes.is_empty() {
        format!("{} messages (chat: {})", messages.len(), sample_messages.join(" / "))
    } else {
        format!(
            "{} messages (emotes: {}, chat: {})",
            messages.len(),
            top_emotes.join(", "),
            sample_messages.join(" / ")
        )
    }
}

/// Build the full correlated chat context string. Falls back to a single
/// whole-buffer summary when no per-transcription correlation group is
/// non-empty.
#[must_use]
pub fn correlated_chat_context(transcriptions: &[Transcription], chat: &[ChatMessage], correlation_window_us: i64) -> String {
    let groups = correlate(transcriptions, chat, correlation_window_us);
    let rendered: Vec<String> = groups
        .iter()
        .filter(|g| !g.matched.is_empty())
        .map(|g| {
            let text = &transcriptions[g.fragment_index].text;
            format!("After \"{text}\": {}", summarize_group(&g.matched))
        })
        .collect();

    if rendered.is_empty() {
        if chat.is_empty() {
            String::new()
        } else {
            summarize_group(chat)
        }
    } else {
        rendered.join(" | ")
    }
}

/// `"Totals: n1 kind1, n2 kind2 | Recent: kind user | …"` (last five,
/// newest last).
#[must_use]
pub fn interaction_context(interactions: &[ViewerInteraction]) -> String {
    if interactions.is_empty() {
        return String::new();
    }
    let mut totals: Vec<(InteractionKind, u32)> = Vec::new();
    for interaction in interactions {
        if let Some(entry) = totals.iter_mut().find(|(kind, _)| *kind == interaction.kind) {
            entry.1 += 1;
        } else {
            totals.push((interaction.kind, 1));
        }
    }
    let totals_str = totals.iter().map(|(kind, count)| format!("{count} {kind}")).collect::<Vec<_>>().join(", ");

    let recent_str = interactions
        .iter()
        .rev()
        .take(5)
        .rev()
        .map(|interaction| format!("{} {}", interaction.kind, interaction.username))
        .collect::<Vec<_>>()
        .join(" | ");

    format!("Totals: {totals_str} | Recent: {recent_str}")
}

/// `"<chat> | Interactions: <inter>"` when interactions exist, else
/// `<chat>` unchanged.
#[must_use]
pub fn combined_context(chat_context: &str, interaction_context: &str) -> String {
    if interaction_context.is_empty() {
        chat_context.to_string()
    } else {
        format!("{chat_context} | Interactions: {interaction_context}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcription(ts_us: i64, text: &str) -> Transcription {
        Transcription { timestamp_us: ts_us, text: text.to_string(), duration_secs: 1.0, confidence: None }
    }

    fn chat(ts_ms: i64, message: &str, emotes: Vec<&str>) -> ChatMessage {
        ChatMessage {
            timestamp_ms: ts_ms,
            username: "viewer".to_string(),
            message: message.to_string(),
            emotes: emotes.iter().map(|s| s.to_string()).collect(),
            native_emotes: vec![],
            is_subscriber: false,
            is_moderator: false,
        }
    }

    #[test]
    fn transcription_context_empty_buffer_returns_empty_string() {
        assert_eq!(transcription_context(&[]), "");
    }

    #[test]
    fn correlated_chat_context_matches_scenario_1() {
        let transcriptions = vec![transcription(1_000_000_000, "gg")];
        let chat = vec![
            chat(1_000_000_005, "nice", vec!["Kappa"]),
            chat(1_000_000_007, "gg", vec![]),
            chat(1_000_000_020, "later", vec![]),
        ];
        let context = correlated_chat_context(&transcriptions, &chat, 10_000_000);
        assert_eq!(context, "After \"gg\": 2 messages (emotes: Kappax1, chat: nice / gg)");
    }

    #[test]
    fn correlated_chat_context_includes_boundary_timestamp() {
        let transcriptions = vec![transcription(0, "go")];
        let chat = vec![chat(10_000, "right on the edge", vec![])];
        let context = correlated_chat_context(&transcriptions, &chat, 10_000_000);
        assert!(context.contains("right on the edge"));
    }

    #[test]
    fn correlated_chat_context_falls_back_to_whole_buffer_when_no_group_matches() {
        let transcriptions = vec![transcription(0, "go")];
        let chat = vec![chat(50_000, "too late", vec![])];
        let context = correlated_chat_context(&transcriptions, &chat, 10_000_000);
        assert!(context.contains("too late"));
    }

    #[test]
    fn interaction_context_empty_returns_empty_string() {
        assert_eq!(interaction_context(&[]), "");
    }

    #[test]
    fn combined_context_appends_interactions_only_when_present() {
        assert_eq!(combined_context("chat stuff", ""), "chat stuff");
        assert_eq!(combined_context("chat stuff", "Totals: 1 follow"), "chat stuff | Interactions: Totals: 1 follow");
    }
}
