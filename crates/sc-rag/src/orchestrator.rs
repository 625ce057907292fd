//! The RAG orchestrator: wires intent routing, retrieval fan-out,
//! vocabulary enrichment, and prompt assembly into one end-to-end
//! question-answering pipeline, with a deterministic fallback when the
//! LLM call itself is unavailable.

use chrono::Utc;
use sc_context_client::ContextClient;
use sc_llm_client::LlmClient;
use sc_protocol::{RagResponse, ResponseType};
use sc_vocabulary_client::VocabularyClient;
use serde_json::json;

use crate::activity_client::ActivityClient;
use crate::error::RagError;
use crate::intent::{route, Retriever};
use crate::prompt_assembly;
use crate::retrievers::{self, RetrievalResults};
use crate::vocabulary_enrichment::{self, VocabularyEnrichment};

const DEFAULT_TIME_WINDOW_HOURS: u32 = 24;

pub struct RagOrchestrator {
    activity: ActivityClient,
    context: ContextClient,
    vocabulary: VocabularyClient,
    llm: LlmClient,
}

impl RagOrchestrator {
    pub fn new(activity: ActivityClient, context: ContextClient, vocabulary: VocabularyClient, llm: LlmClient) -> Self {
        RagOrchestrator { activity, context, vocabulary, llm }
    }

    /// Current entry count of the vocabulary cache, surfaced by the
    /// service's `/status` endpoint.
    #[must_use]
    pub fn vocabulary_cache_entries(&self) -> u64 {
        self.vocabulary.cache_entry_count()
    }

    /// Answer a streamer's question about their own channel.
    /// Never returns `Err` except for the one genuinely-unanswerable input:
    /// an empty question. Everything downstream degrades to a lower
    /// confidence answer instead of propagating.
    pub async fn answer(&self, question: &str, time_window_hours: Option<u32>) -> Result<RagResponse, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuestion);
        }
        let time_window_hours = time_window_hours.unwrap_or(DEFAULT_TIME_WINDOW_HOURS);

        let retrievers = route(question);
        let results = retrievers::fetch_all(&self.activity, &self.context, &retrievers).await;

        let chat_text = chat_text_for_enrichment(&results);
        let vocabulary = vocabulary_enrichment::enrich(&self.vocabulary, &chat_text).await;

        let prompt = prompt_assembly::assemble(question, &results, &vocabulary);

        let (answer, confidence, reasoning, response_type, suggestions) = match self.llm.generate_response(&prompt).await {
            Ok(generated) => (generated.answer, generated.confidence, generated.reasoning, generated.response_type, generated.suggestions),
            Err(err) => {
                tracing::warn!(error = %err, "llm generate_response failed; synthesizing a deterministic fallback answer");
                let (answer, confidence) = deterministic_fallback(&results);
                (answer, confidence, "the language model was unavailable; this answer was assembled directly from retrieved data".to_string(), ResponseType::Fallback, None)
            }
        };

        Ok(RagResponse {
            success: true,
            question: question.to_string(),
            answer,
            confidence,
            response_type,
            reasoning,
            suggestions,
            data_summary: data_summary(&results, &vocabulary),
            sources: sources_used(&retrievers),
            time_window_hours,
            timestamp: Utc::now(),
        })
    }
}

fn chat_text_for_enrichment(results: &RetrievalResults) -> String {
    let Some(events) = &results.chat_events else {
        return String::new();
    };
    events
        .iter()
        .filter_map(|event| event.get("message").and_then(serde_json::Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn sources_used(retrievers: &[Retriever]) -> Vec<String> {
    retrievers
        .iter()
        .map(|retriever| match retriever {
            Retriever::SubscriptionEvents => "subscription_events".to_string(),
            Retriever::FollowerEvents => "follower_events".to_string(),
            Retriever::ChatActivity => "chat_activity".to_string(),
            Retriever::StreamInfo => "stream_info".to_string(),
            Retriever::RaidEvents => "raid_events".to_string(),
            Retriever::CheerEvents => "cheer_events".to_string(),
            Retriever::AiContextAnalysis => "ai_context_analysis".to_string(),
            Retriever::ActivityStats => "activity_stats".to_string(),
            Retriever::ContextSearch(terms) => format!("context_search({})", terms.join(" ")),
        })
        .collect()
}

fn data_summary(results: &RetrievalResults, vocabulary: &VocabularyEnrichment) -> serde_json::Value {
    json!({
        "activity_stats": results.activity_stats.is_some(),
        "subscription_events": results.subscription_events.as_ref().map(Vec::len),
        "follower_events": results.follower_events.as_ref().map(Vec::len),
        "raid_events": results.raid_events.as_ref().map(Vec::len),
        "cheer_events": results.cheer_events.as_ref().map(Vec::len),
        "chat_events": results.chat_events.as_ref().map(Vec::len),
        "stream_live": results.stream_status.as_ref().map(|s| s.is_live),
        "context_analysis_records": results.context_analysis.as_ref().map(Vec::len),
        "context_search_matches": results.context_search.as_ref().map(|(_, records)| records.len()),
        "vocabulary_matches": vocabulary.matched.len(),
    })
}

/// When the structured LLM call can't be completed, assemble a
/// best-effort answer directly from whatever retrieval data came back, at
/// a confidence that reflects it's not model-reasoned.
fn deterministic_fallback(results: &RetrievalResults) -> (String, f64) {
    let mut facts = Vec::new();
    let mut confidence: f64 = 0.5;

    if let Some(stats) = &results.activity_stats {
        facts.push(format!(
            "{} subscriptions, {} follows, {} cheers, and {} chat messages were recorded",
            stats.subscriptions, stats.follows, stats.cheers, stats.chat_messages
        ));
        confidence = 0.6;
    }
    if let Some(status) = &results.stream_status {
        facts.push(if status.is_live { "the stream is currently live".to_string() } else { "the stream is currently offline".to_string() });
    }
    if let Some(events) = &results.subscription_events {
        facts.push(format!("{} subscription events on record", events.len()));
    }
    if let Some(events) = &results.follower_events {
        facts.push(format!("{} follower events on record", events.len()));
    }

    if facts.is_empty() {
        ("No data was available to answer this question right now.".to_string(), 0.5)
    } else {
        (format!("Based on recorded activity: {}.", facts.join("; ")), confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_client::{ActivityClientConfig, ActivityStats};

    #[test]
    fn deterministic_fallback_uses_activity_stats_when_present() {
        let mut results = RetrievalResults::default();
        results.activity_stats = Some(ActivityStats { total_events: 10, unique_users: 3, chat_messages: 5, follows: 1, subscriptions: 2, cheers: 0 });
        let (answer, confidence) = deterministic_fallback(&results);
        assert!(answer.contains("2 subscriptions"));
        assert_eq!(confidence, 0.6);
    }

    #[test]
    fn deterministic_fallback_reports_no_data_when_everything_is_absent() {
        let results = RetrievalResults::default();
        let (answer, confidence) = deterministic_fallback(&results);
        assert!(answer.contains("No data"));
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn sources_used_names_every_retriever_including_context_search_terms() {
        let retrievers = vec![Retriever::ActivityStats, Retriever::ContextSearch(vec!["banana".to_string()])];
        let sources = sources_used(&retrievers);
        assert_eq!(sources, vec!["activity_stats".to_string(), "context_search(banana)".to_string()]);
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_any_retrieval() {
        let activity = ActivityClient::new(ActivityClientConfig::default()).unwrap();
        let context = ContextClient::new(sc_context_client::ContextClientConfig::default()).unwrap();
        let vocabulary = VocabularyClient::new(sc_vocabulary_client::VocabularyClientConfig::default()).unwrap();
        let llm = LlmClient::new(sc_llm_client::LlmClientConfig::default()).unwrap();
        let orchestrator = RagOrchestrator::new(activity, context, vocabulary, llm);
        let result = orchestrator.answer("   ", None).await;
        assert!(matches!(result, Err(RagError::EmptyQuestion)));
    }
}
