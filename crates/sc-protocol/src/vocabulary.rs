//! Community vocabulary entries: channel-specific memes, inside jokes, and
//! recurring phrases surfaced to the RAG orchestrator for prompt enrichment.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyCategory {
    Meme,
    InsideJoke,
    Catchphrase,
    EmotePhrase,
    Reference,
    Slang,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub phrase: String,
    pub category: VocabularyCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u32>,
}
