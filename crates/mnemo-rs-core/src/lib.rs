//! Memory orchestration for Mnemo.
//!
//! This crate owns the per-turn orchestrator that reconciles short-term and
//! long-term memory, plus the policy pieces it is built from: recall/persist
//! triggers, summarization, prompt assembly, LLM port adapters, backend
//! construction and background session clean-up.

pub mod cleaner;
pub mod error;
pub mod factory;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod summarizer;
pub mod trigger;

pub use cleaner::SessionCleaner;
pub use error::MnemoCoreError;
pub use factory::Endpoint;
pub use llm::{LlmEmbeddingPort, LlmGenerationPort};
/// Orchestrator facade and turn results.
pub use orchestrator::{Orchestrator, OrchestratorBuilder, TurnOutcome, TurnWarning};
pub use summarizer::Summarizer;
/// Long-term memory trigger strategies.
pub use trigger::{MemoryTrigger, NeverTrigger, RegexTrigger};
