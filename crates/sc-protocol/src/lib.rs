//! Shared wire and domain types for the stream-analysis services.
//!
//! Every crate in this workspace that crosses a process boundary (WebSocket
//! ingest, HTTP clients, the RAG query surface) speaks these types. Keeping
//! them in one crate means the correlator, the LLM/context/vocabulary
//! clients, and the RAG orchestrator can all serialize/deserialize the same
//! shapes without re-declaring them.

pub mod analysis;
pub mod context;
pub mod events;
pub mod rag;
pub mod timestamp;
pub mod vocabulary;

pub use analysis::{AnalysisResult, FlexiblePatterns, Sentiment, StreamDynamics};
pub use context::ContextRecord;
pub use events::{ChatMessage, EmoteEvent, InteractionKind, Transcription, ViewerInteraction};
pub use rag::{RagQuery, RagResponse, ResponseType};
pub use vocabulary::{VocabularyCategory, VocabularyEntry};
