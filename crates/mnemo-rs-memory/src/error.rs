//! Error types for memory operations.

use mnemo_rs_protocol::PortError;

/// Errors returned by memory stores and backends.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The backing key-value or search service could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Vectorizing content failed.
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
    /// Generating text failed.
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    /// Persisting a long-term record failed.
    #[error("index write failed: {0}")]
    IndexWriteFailed(String),
    /// The search store returned a hit that could not be parsed.
    #[error("malformed retrieval result: {0}")]
    MalformedRetrievalResult(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<PortError> for MemoryError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::EmbeddingUnavailable(message) => MemoryError::EmbeddingFailed(message),
            other => MemoryError::GenerationFailed(other.to_string()),
        }
    }
}
