use std::time::Duration;

/// Errors returned by embedding and generation ports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The embedding backend could not produce a vector.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    /// The generation backend failed or returned no text.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),
    /// The generation call did not finish in time.
    #[error("generation timed out after {0:?}")]
    GenerationTimeout(Duration),
}
