//! Failure domain for the stream correlator. None of these are fatal to
//! the surrounding process — every variant is logged and the correlator
//! continues.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("analysis already in flight")]
    AnalysisInFlight,
    #[error("transcription buffer empty; nothing to analyze")]
    EmptyTranscriptionBuffer,
    #[error("analysis cooldown not elapsed")]
    Cooldown,
    #[error("LLM client returned no analysis")]
    LlmAnalysisUnavailable,
}
