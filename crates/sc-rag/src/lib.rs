mod activity_client;
mod error;
mod intent;
mod orchestrator;
mod prompt_assembly;
mod retrievers;
mod vocabulary_enrichment;
mod websocket;

pub use activity_client::{ActivityClient, ActivityClientConfig, ActivityStats, StreamStatus};
pub use error::RagError;
pub use intent::{route, Retriever};
pub use orchestrator::RagOrchestrator;
pub use retrievers::RetrievalResults;
pub use vocabulary_enrichment::VocabularyEnrichment;
pub use websocket::{handle_query, RagErrorMessage, RagQueryMessage, RagResponseMessage};
