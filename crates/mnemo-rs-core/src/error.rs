//! Error types for the core orchestrator crate.

use mnemo_rs_config::ConfigError;
use mnemo_rs_memory::MemoryError;
use mnemo_rs_protocol::PortError;
use thiserror::Error;

/// Errors returned by orchestrator operations.
///
/// A turn only fails with `Memory` (short-term read or write) or
/// `Generation`; every long-term or summarization failure is reported as a
/// warning on the turn outcome instead.
#[derive(Debug, Error)]
pub enum MnemoCoreError {
    /// Short-term memory could not be read or written.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// The generation port failed to answer.
    #[error("generation error: {0}")]
    Generation(#[from] PortError),
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// A trigger pattern failed to compile.
    #[error("invalid trigger pattern: {0}")]
    InvalidTrigger(#[from] regex::Error),
    /// Endpoint scheme is not one of the bundled backends.
    #[error("unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),
    /// A required collaborator was not supplied to the builder.
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}
