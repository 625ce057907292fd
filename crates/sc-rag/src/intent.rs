//! Intent routing: case-fold the question, match it against keyword sets,
//! and decide which retrievers to invoke.

/// One retrieval source the orchestrator can fan out to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Retriever {
    SubscriptionEvents,
    FollowerEvents,
    ChatActivity,
    StreamInfo,
    RaidEvents,
    CheerEvents,
    AiContextAnalysis,
    ActivityStats,
    /// Fallback full-text search against recent context transcripts, keyed
    /// by the extracted search terms.
    ContextSearch(Vec<String>),
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "what", "how", "why", "when", "where", "who", "did", "do", "does",
    "of", "in", "on", "at", "to", "for", "and", "or", "it", "this", "that", "there", "with",
];

struct KeywordRule {
    keywords: &'static [&'static str],
    retriever: fn() -> Retriever,
}

const RULES: &[KeywordRule] = &[
    KeywordRule { keywords: &["sub", "subscriber", "gift", "resub"], retriever: || Retriever::SubscriptionEvents },
    KeywordRule { keywords: &["follow", "new viewer"], retriever: || Retriever::FollowerEvents },
    KeywordRule { keywords: &["chat", "message", "said", "talking"], retriever: || Retriever::ChatActivity },
    KeywordRule { keywords: &["game", "playing", "stream", "title"], retriever: || Retriever::StreamInfo },
    KeywordRule { keywords: &["raid", "host"], retriever: || Retriever::RaidEvents },
    KeywordRule { keywords: &["bits", "cheer"], retriever: || Retriever::CheerEvents },
    KeywordRule {
        keywords: &["mood", "sentiment", "energy", "vibe", "pattern", "trend", "topic"],
        retriever: || Retriever::AiContextAnalysis,
    },
];

/// Route a question to the retrievers it should fan out to. Activity stats
/// are always included; if no keyword rule fires, 1-3 non-stopword tokens
/// are extracted and a context-transcript search is added instead.
#[must_use]
pub fn route(question: &str) -> Vec<Retriever> {
    let folded = question.to_lowercase();

    let mut retrievers: Vec<Retriever> = RULES
        .iter()
        .filter(|rule| rule.keywords.iter().any(|kw| folded.contains(kw)))
        .map(|rule| (rule.retriever)())
        .collect();

    if retrievers.is_empty() {
        let terms = extract_search_terms(&folded);
        retrievers.push(Retriever::ContextSearch(terms));
    }

    retrievers.push(Retriever::ActivityStats);
    retrievers
}

fn extract_search_terms(folded_question: &str) -> Vec<String> {
    folded_question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !STOPWORDS.contains(token))
        .take(3)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_question_routes_to_subscription_and_activity_only() {
        let retrievers = route("How many subs today?");
        assert_eq!(retrievers, vec![Retriever::SubscriptionEvents, Retriever::ActivityStats]);
    }

    #[test]
    fn mood_question_routes_to_ai_analysis_and_activity_only() {
        let retrievers = route("what's the vibe?");
        assert_eq!(retrievers, vec![Retriever::AiContextAnalysis, Retriever::ActivityStats]);
    }

    #[test]
    fn unrecognized_question_falls_back_to_context_search_with_extracted_terms() {
        let retrievers = route("banana purple");
        assert_eq!(retrievers, vec![Retriever::ContextSearch(vec!["banana".to_string(), "purple".to_string()]), Retriever::ActivityStats]);
    }

    #[test]
    fn extracted_search_terms_drop_stopwords_and_cap_at_three() {
        let terms = extract_search_terms("what is the mystery of this weird thing");
        assert!(terms.len() <= 3);
        assert!(!terms.contains(&"is".to_string()));
        assert!(!terms.contains(&"the".to_string()));
    }
}
