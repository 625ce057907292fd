//! The stream correlator: bounded intake buffers for transcription, chat,
//! emote, and interaction events; periodic LLM-backed pattern analysis; and
//! two-minute context-window sealing to the context-storage service.

mod buffer;
mod config;
mod context_assembly;
mod context_window;
mod correlator;
mod error;
mod metrics;
mod session;
mod speaking_patterns;
mod temporal_trend;

pub use buffer::BufferStats;
pub use config::CorrelatorConfig;
pub use correlator::{Correlator, CorrelatorStatus};
pub use error::CorrelatorError;
