//! Prompt assembly: renders the retrieved sources and enriched vocabulary
//! into the sections the LLM's user prompt is built from.

use crate::retrievers::RetrievalResults;
use crate::vocabulary_enrichment::VocabularyEnrichment;

/// A stream-flow section describing whether the stream is live or
/// offline. Offline is explicitly framed as the normal end-of-stream
/// state, not an error, so the model doesn't hedge or apologize for it.
fn stream_flow_section(results: &RetrievalResults) -> String {
    match &results.stream_status {
        Some(status) if status.is_live => {
            let game = status.game_name.as_deref().unwrap_or("an unspecified game");
            let title = status.stream_title.as_deref().unwrap_or("untitled");
            format!("Stream flow: currently LIVE, playing {game}, titled \"{title}\".")
        }
        Some(_) => "Stream flow: currently OFFLINE. This is the normal end-of-stream state, not an error.".to_string(),
        None => "Stream flow: unknown (stream status unavailable).".to_string(),
    }
}

fn vocabulary_section(vocabulary: &VocabularyEnrichment) -> String {
    if vocabulary.matched.is_empty() && vocabulary.popular.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Channel vocabulary:".to_string()];
    for entry in &vocabulary.matched {
        let definition = entry.definition.as_deref().unwrap_or("no definition on file");
        lines.push(format!("- \"{}\" ({:?}): {definition}", entry.phrase, entry.category));
    }
    if !vocabulary.popular.is_empty() {
        let popular_phrases: Vec<&str> = vocabulary.popular.iter().map(|e| e.phrase.as_str()).collect();
        lines.push(format!("Popular terms: {}", popular_phrases.join(", ")));
    }
    lines.join("\n")
}

fn source_sections(results: &RetrievalResults) -> Vec<String> {
    let mut sections = Vec::new();

    if let Some(stats) = &results.activity_stats {
        sections.push(format!(
            "Activity stats: {} total events, {} unique users, {} chat messages, {} follows, {} subscriptions, {} cheers.",
            stats.total_events, stats.unique_users, stats.chat_messages, stats.follows, stats.subscriptions, stats.cheers
        ));
    }
    if let Some(events) = &results.subscription_events {
        sections.push(format!("Subscription events ({}): {}", events.len(), summarize_events(events)));
    }
    if let Some(events) = &results.follower_events {
        sections.push(format!("Follower events ({}): {}", events.len(), summarize_events(events)));
    }
    if let Some(events) = &results.raid_events {
        sections.push(format!("Raid events ({}): {}", events.len(), summarize_events(events)));
    }
    if let Some(events) = &results.cheer_events {
        sections.push(format!("Cheer events ({}): {}", events.len(), summarize_events(events)));
    }
    if let Some(events) = &results.chat_events {
        sections.push(format!("Chat activity ({} messages): {}", events.len(), summarize_events(events)));
    }
    if let Some(records) = &results.context_analysis {
        let excerpts: Vec<&str> = records.iter().filter_map(|r| r.topics.as_ref()).flatten().map(String::as_str).take(5).collect();
        if !excerpts.is_empty() {
            sections.push(format!("Recent AI pattern topics: {}", excerpts.join(", ")));
        }
    }
    if let Some((terms, records)) = &results.context_search {
        let transcripts: Vec<&str> = records.iter().map(|r| r.transcript.as_str()).take(3).collect();
        sections.push(format!("Context search for \"{}\" ({} matches): {}", terms.join(" "), records.len(), transcripts.join(" | ")));
    }

    sections
}

fn summarize_events(events: &[serde_json::Value]) -> String {
    if events.is_empty() {
        "none".to_string()
    } else {
        format!("{} recorded", events.len())
    }
}

const INSTRUCTION_BLOCK: &str = "You are answering a question from the streamer about their own channel. \
Respond ONLY with a single JSON object: {\"answer\": string, \"confidence\": float in [0,1], \
\"reasoning\": string, \"response_type\": one of \"factual\"|\"creative\"|\"clarification\"|\"insufficient_data\"|\"fallback\", \
\"suggestions\": optional list of strings}. Do not wrap the JSON in prose or code fences.";

/// Assemble the full user prompt sent to the LLM client's `generate_response`.
#[must_use]
pub fn assemble(question: &str, results: &RetrievalResults, vocabulary: &VocabularyEnrichment) -> String {
    let mut parts = vec![stream_flow_section(results)];

    let vocab_section = vocabulary_section(vocabulary);
    if !vocab_section.is_empty() {
        parts.push(vocab_section);
    }

    parts.extend(source_sections(results));
    parts.push(INSTRUCTION_BLOCK.to_string());
    parts.push(format!("Question: {question}"));

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_client::StreamStatus;

    #[test]
    fn offline_stream_is_framed_as_normal_not_an_error() {
        let mut results = RetrievalResults::default();
        results.stream_status = Some(StreamStatus { is_live: false, ..Default::default() });
        let section = stream_flow_section(&results);
        assert!(section.contains("OFFLINE"));
        assert!(section.contains("normal"));
    }

    #[test]
    fn assemble_includes_the_question_and_instruction_block() {
        let results = RetrievalResults::default();
        let vocabulary = VocabularyEnrichment::default();
        let prompt = assemble("How many subs today?", &results, &vocabulary);
        assert!(prompt.contains("How many subs today?"));
        assert!(prompt.contains("response_type"));
    }
}
