use crate::error::PortError;
use crate::message::PromptMessage;
use async_trait::async_trait;

/// Turns text into a fixed-size vector.
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError>;
}

/// Turns a prompt into free text.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Generate a completion for the given prompt messages.
    async fn generate(&self, messages: &[PromptMessage]) -> Result<String, PortError>;
}
