//! The three concrete WebSocket edges built atop the resilient foundation:
//! the transcription and event ingest clients that feed the
//! [`sc_correlator::Correlator`], and the Phoenix egress client used by the
//! transcription producer side to publish upstream.

pub mod decode;
pub mod egress_client;
pub mod event_client;
pub mod transcription_client;

pub use egress_client::PhoenixEgressClient;
pub use event_client::EventClient;
pub use transcription_client::TranscriptionClient;
