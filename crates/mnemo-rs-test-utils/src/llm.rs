//! Scripted `autoagents-llm` provider for exercising the LLM port adapters.

use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{LLMProvider, ToolCall};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    NoText,
    Fail(String),
}

#[derive(Debug)]
struct CannedResponse(Option<String>);

impl std::fmt::Display for CannedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or_default())
    }
}

impl ChatResponse for CannedResponse {
    fn text(&self) -> Option<String> {
        self.0.clone()
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Provider with one canned behaviour for chat, completion and embedding.
///
/// Every chat transcript it receives is recorded, oldest first.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    reply: Reply,
    embedding: Vec<f32>,
    delay: Duration,
    transcripts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl FixedLLM {
    /// Answers every chat with `text` and embeds every input as `[0, 0]`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_reply(Reply::Text(text.into()))
    }

    /// Chat responses carry no text.
    pub fn without_text() -> Self {
        Self::with_reply(Reply::NoText)
    }

    /// Every call fails with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            embedding: vec![0.0, 0.0],
            delay: Duration::ZERO,
            transcripts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Sleep before answering a chat.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Chat transcripts received so far; clones share the record.
    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().clone()
    }

    fn fail_if_scripted(&self) -> Result<(), LLMError> {
        match &self.reply {
            Reply::Fail(message) => Err(LLMError::ProviderError(message.clone())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ChatProvider for FixedLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.transcripts.lock().push(messages.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.fail_if_scripted()?;
        let text = match &self.reply {
            Reply::Text(text) => Some(text.clone()),
            _ => None,
        };
        Ok(Box::new(CannedResponse(text)))
    }
}

#[async_trait]
impl CompletionProvider for FixedLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        self.fail_if_scripted()?;
        let text = match &self.reply {
            Reply::Text(text) => text.clone(),
            _ => String::new(),
        };
        Ok(CompletionResponse { text })
    }
}

#[async_trait]
impl EmbeddingProvider for FixedLLM {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        self.fail_if_scripted()?;
        Ok(vec![self.embedding.clone(); input.len()])
    }
}

#[async_trait]
impl ModelsProvider for FixedLLM {}

impl LLMProvider for FixedLLM {}
