//! Environment-sourced configuration for both service binaries.
//!
//! Parsing happens exactly once, in each binary's `main`, via `clap`'s
//! derive machinery with the `env` feature — there is no mutable global
//! configuration state anywhere in this workspace; a `Config` value is
//! threaded explicitly into every constructor that needs it.

pub mod correlator;
pub mod error;
pub mod rag;
pub mod shared;

pub use correlator::CorrelatorServiceConfig;
pub use error::ConfigError;
pub use rag::RagServiceConfig;
