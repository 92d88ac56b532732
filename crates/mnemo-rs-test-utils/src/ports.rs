//! Deterministic embedding and generation port doubles.

use async_trait::async_trait;
use mnemo_rs_memory::scoring::tokenize;
use mnemo_rs_protocol::{EmbeddingPort, GenerationPort, PortError, PromptMessage, PromptRole};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

type PromptLog = Arc<Mutex<Vec<Vec<PromptMessage>>>>;

/// Bag-of-words embedder: each search term is hashed into one bucket.
///
/// Texts sharing terms get positive cosine similarity; texts with no shared
/// terms are (almost always) orthogonal.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dims];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingPort for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        Ok(self.vector(text))
    }
}

/// Embedder that always reports the service as unavailable.
#[derive(Debug, Clone)]
pub struct FailingEmbedder {
    message: String,
}

impl FailingEmbedder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl EmbeddingPort for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, PortError> {
        Err(PortError::EmbeddingUnavailable(self.message.clone()))
    }
}

fn last_user_content(messages: &[PromptMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|message| message.role == PromptRole::User)
        .map(|message| message.content.clone())
        .unwrap_or_default()
}

/// Generator that answers with the last user message verbatim.
///
/// Used as a summarizer it returns the transcript it was asked to compress,
/// which lets tests check exactly which rounds a summary covers.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator {
    prompts: PromptLog,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl GenerationPort for EchoGenerator {
    async fn generate(&self, messages: &[PromptMessage]) -> Result<String, PortError> {
        self.prompts.lock().push(messages.to_vec());
        Ok(last_user_content(messages))
    }
}

/// Generator that always returns the same text and records its prompts.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    response: String,
    prompts: PromptLog,
}

impl FixedGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<Vec<PromptMessage>> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl GenerationPort for FixedGenerator {
    async fn generate(&self, messages: &[PromptMessage]) -> Result<String, PortError> {
        self.prompts.lock().push(messages.to_vec());
        Ok(self.response.clone())
    }
}

/// Generator that always reports the service as unavailable.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    message: String,
}

impl FailingGenerator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl GenerationPort for FailingGenerator {
    async fn generate(&self, _messages: &[PromptMessage]) -> Result<String, PortError> {
        Err(PortError::GenerationUnavailable(self.message.clone()))
    }
}

/// Generator that sleeps before answering with the last user message.
///
/// Scripted delays are consumed in call order; once exhausted the default
/// delay applies.
#[derive(Debug, Clone)]
pub struct SlowGenerator {
    default_delay: Duration,
    scripted: Arc<Mutex<VecDeque<Duration>>>,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            scripted: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn with_delays(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            default_delay: Duration::ZERO,
            scripted: Arc::new(Mutex::new(delays.into_iter().collect())),
        }
    }
}

#[async_trait]
impl GenerationPort for SlowGenerator {
    async fn generate(&self, messages: &[PromptMessage]) -> Result<String, PortError> {
        let delay = self
            .scripted
            .lock()
            .pop_front()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;
        Ok(last_user_content(messages))
    }
}
