//! Vocabulary enrichment: scan chat text for candidate phrases and
//! emote-shaped tokens, look each up via the vocabulary cache, and attach
//! definitions for prompt assembly.

use std::sync::LazyLock;

use regex::Regex;
use sc_protocol::VocabularyEntry;
use sc_vocabulary_client::VocabularyClient;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "was", "were", "have", "has", "had", "you", "your", "are", "not",
];

/// `^[a-z]{3,}(?:[A-Z][A-Z0-9]*|[A-Z][a-z][a-zA-Z0-9]*)$`, e.g. `pogChamp`
/// or `hypeTRAIN`.
static EMOTE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{3,}(?:[A-Z][A-Z0-9]*|[A-Z][a-z][a-zA-Z0-9]*)$").expect("static regex is valid")
});

fn candidate_terms(chat_text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in chat_text.split_whitespace() {
        let cleaned: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
        if cleaned.is_empty() {
            continue;
        }
        let lower = cleaned.to_lowercase();
        if cleaned.len() >= 3 && !STOPWORDS.contains(&lower.as_str()) {
            terms.push(cleaned.clone());
        }
        if cleaned.len() >= 5 && EMOTE_SHAPE.is_match(&cleaned) && !terms.contains(&cleaned) {
            terms.push(cleaned);
        }
    }
    terms.sort();
    terms.dedup();
    terms
}

/// Looked-up vocabulary: per-term definitions plus a fixed set of popular
/// entries for general context.
#[derive(Debug, Clone, Default)]
pub struct VocabularyEnrichment {
    pub matched: Vec<VocabularyEntry>,
    pub popular: Vec<VocabularyEntry>,
}

pub async fn enrich(client: &VocabularyClient, chat_text: &str) -> VocabularyEnrichment {
    let terms = candidate_terms(chat_text);
    let mut matched = Vec::new();
    for term in &terms {
        let entries = sc_runtime::guarded("vocabulary.search", client.search(term, 3)).await.unwrap_or_default();
        matched.extend(entries);
    }
    let popular = sc_runtime::guarded("vocabulary.popular", client.popular(10)).await.unwrap_or_default();
    VocabularyEnrichment { matched, popular }
}
