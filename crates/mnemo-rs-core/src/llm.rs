//! Port adapters over `autoagents-llm` providers.

use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use log::{debug, warn};
use mnemo_rs_protocol::{EmbeddingPort, GenerationPort, PortError, PromptMessage, PromptRole};
use std::sync::Arc;
use std::time::Duration;

/// Default time budget for one generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Generation port backed by any `LLMProvider`, bounded by a timeout.
#[derive(Clone)]
pub struct LlmGenerationPort {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl LlmGenerationPort {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn to_chat_messages(messages: &[PromptMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| ChatMessage {
            role: match message.role {
                PromptRole::System => ChatRole::System,
                PromptRole::User => ChatRole::User,
                PromptRole::Assistant => ChatRole::Assistant,
            },
            message_type: MessageType::Text,
            content: message.content.clone(),
        })
        .collect()
}

#[async_trait]
impl GenerationPort for LlmGenerationPort {
    async fn generate(&self, messages: &[PromptMessage]) -> Result<String, PortError> {
        let chat = to_chat_messages(messages);
        debug!(
            "generation request (messages={}, timeout_ms={})",
            chat.len(),
            self.timeout.as_millis()
        );
        let request = self.provider.chat_with_tools(&chat, None, None);
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                warn!("generation timed out (timeout_ms={})", self.timeout.as_millis());
                PortError::GenerationTimeout(self.timeout)
            })?
            .map_err(|err| PortError::GenerationUnavailable(err.to_string()))?;
        response.text().ok_or_else(|| {
            PortError::GenerationUnavailable("response carried no text".to_string())
        })
    }
}

/// Embedding port backed by any `LLMProvider`.
#[derive(Clone)]
pub struct LlmEmbeddingPort {
    provider: Arc<dyn LLMProvider>,
}

impl LlmEmbeddingPort {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl EmbeddingPort for LlmEmbeddingPort {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        let mut vectors = self
            .provider
            .embed(vec![text.to_string()])
            .await
            .map_err(|err| PortError::EmbeddingUnavailable(err.to_string()))?;
        if vectors.is_empty() {
            return Err(PortError::EmbeddingUnavailable(
                "provider returned no vector".to_string(),
            ));
        }
        Ok(vectors.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::{LlmEmbeddingPort, LlmGenerationPort, to_chat_messages};
    use autoagents_llm::LLMProvider;
    use autoagents_llm::chat::ChatRole;
    use mnemo_rs_protocol::{EmbeddingPort, GenerationPort, PortError, PromptMessage};
    use mnemo_rs_test_utils::FixedLLM;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn prompt_roles_map_to_chat_roles() {
        let chat = to_chat_messages(&[
            PromptMessage::system("be brief"),
            PromptMessage::user("hi"),
            PromptMessage::assistant("hello"),
        ]);
        assert_eq!(chat.len(), 3);
        assert!(matches!(chat[0].role, ChatRole::System));
        assert!(matches!(chat[1].role, ChatRole::User));
        assert!(matches!(chat[2].role, ChatRole::Assistant));
        assert_eq!(chat[0].content, "be brief");
    }

    #[tokio::test]
    async fn generation_returns_provider_text() {
        let llm = FixedLLM::new("answer");
        let port = LlmGenerationPort::new(Arc::new(llm.clone()));
        let text = port
            .generate(&[PromptMessage::system("sys"), PromptMessage::user("question")])
            .await
            .expect("generate");
        assert_eq!(text, "answer");
        let transcripts = llm.transcripts();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].len(), 2);
        assert!(matches!(transcripts[0][0].role, ChatRole::System));
    }

    #[tokio::test]
    async fn generation_without_text_is_unavailable() {
        let port = LlmGenerationPort::new(Arc::new(FixedLLM::without_text()));
        let err = port.generate(&[PromptMessage::user("q")]).await.unwrap_err();
        assert!(matches!(err, PortError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn provider_error_maps_to_unavailable() {
        let provider: Arc<dyn LLMProvider> = Arc::new(FixedLLM::failing("quota"));
        let err = LlmGenerationPort::new(provider.clone())
            .generate(&[PromptMessage::user("q")])
            .await
            .unwrap_err();
        assert!(
            matches!(err, PortError::GenerationUnavailable(message) if message.contains("quota"))
        );
        let err = LlmEmbeddingPort::new(provider).embed("q").await.unwrap_err();
        assert!(matches!(err, PortError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let llm = FixedLLM::new("late").with_delay(Duration::from_millis(200));
        let port = LlmGenerationPort::new(Arc::new(llm)).with_timeout(Duration::from_millis(20));
        let err = port.generate(&[PromptMessage::user("q")]).await.unwrap_err();
        assert_eq!(err, PortError::GenerationTimeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn embedding_returns_first_vector() {
        let llm = FixedLLM::new("").with_embedding(vec![0.25, 0.75]);
        let port = LlmEmbeddingPort::new(Arc::new(llm));
        assert_eq!(port.embed("text").await.expect("embed"), vec![0.25, 0.75]);
    }
}
