//! Per-turn memory orchestration.

mod builder;
mod locks;
mod memory;
mod outcome;

pub use builder::OrchestratorBuilder;
pub use outcome::{TurnOutcome, TurnWarning};

use crate::error::MnemoCoreError;
use crate::factory;
use crate::llm::{LlmEmbeddingPort, LlmGenerationPort};
use crate::prompt::compose_answer_prompt;
use crate::summarizer::Summarizer;
use crate::trigger::{MemoryTrigger, RegexTrigger};
use autoagents_llm::LLMProvider;
use chrono::Utc;
use locks::SessionLocks;
use log::{debug, info, warn};
use mnemo_rs_config::MnemoConfig;
use mnemo_rs_memory::{LongTermStore, MemoryError, MemoryRecord, Role, ShortTermStore};
use mnemo_rs_protocol::{EmbeddingPort, GenerationPort};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Coordinates both memory tiers and the generation port for each turn.
///
/// A turn reads short-term context, optionally recalls long-term records,
/// generates an answer, appends the round, refreshes a stale summary, and
/// optionally persists a fact. Only short-term failures and generation
/// failures abort a turn.
pub struct Orchestrator {
    short_term: ShortTermStore,
    long_term: LongTermStore,
    generator: Arc<dyn GenerationPort>,
    summarizer: Summarizer,
    trigger: Arc<dyn MemoryTrigger>,
    top_k: usize,
    fact_kind: String,
    session_locks: Option<SessionLocks>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("short_term", &self.short_term)
            .field("long_term", &self.long_term)
            .field("summarizer", &self.summarizer)
            .field("top_k", &self.top_k)
            .field("fact_kind", &self.fact_kind)
            .field("serialized", &self.session_locks.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Build an orchestrator from configuration and explicit ports.
    pub fn from_config(
        config: &MnemoConfig,
        embedder: Arc<dyn EmbeddingPort>,
        generator: Arc<dyn GenerationPort>,
    ) -> Result<Self, MnemoCoreError> {
        config.validate()?;
        let memory_config = &config.memory;
        let backends = &config.backends;
        debug!(
            "building orchestrator (window_size={}, top_k={}, backing_store={}, search_store={}, embedding_model={:?}, generation_model={:?})",
            memory_config.window_size,
            memory_config.top_k,
            backends.backing_store_endpoint,
            backends.search_store_endpoint,
            config.models.embedding_model_ref,
            config.models.generation_model_ref
        );
        let short_term = ShortTermStore::new(
            factory::key_value_backend(&backends.backing_store_endpoint)?,
            memory_config.window_size,
        );
        let long_term = LongTermStore::new(
            factory::search_backend(&backends.search_store_endpoint)?,
            embedder,
            backends.search_index.clone(),
            memory::recall_options_from_config(&memory_config.recall),
        );
        Self::builder()
            .short_term(short_term)
            .long_term(long_term)
            .generator(generator)
            .summary(memory_config.summary.clone())
            .trigger(Arc::new(RegexTrigger::from_config(&memory_config.triggers)?))
            .top_k(memory_config.top_k)
            .fact_kind(memory_config.fact_kind.clone())
            .serialize_session_turns(memory_config.serialize_session_turns)
            .build()
    }

    /// Build an orchestrator whose ports are both backed by one LLM provider.
    pub fn from_provider(
        config: &MnemoConfig,
        provider: Arc<dyn LLMProvider>,
    ) -> Result<Self, MnemoCoreError> {
        let timeout = Duration::from_secs(config.models.generation_timeout_secs);
        let embedder = Arc::new(LlmEmbeddingPort::new(provider.clone()));
        let generator = Arc::new(LlmGenerationPort::new(provider).with_timeout(timeout));
        Self::from_config(config, embedder, generator)
    }

    pub fn short_term(&self) -> &ShortTermStore {
        &self.short_term
    }

    pub fn long_term(&self) -> &LongTermStore {
        &self.long_term
    }

    /// Check the short-term backend and create the long-term index.
    ///
    /// An unreachable key-value store is an error; a search store that cannot
    /// create its index only degrades recall, so it is logged.
    pub async fn prepare(&self) -> Result<(), MnemoCoreError> {
        self.short_term.ping().await?;
        if let Err(err) = self.long_term.ensure_index().await {
            warn!(
                "long-term index unavailable (index={}, err={})",
                self.long_term.index(),
                err
            );
        }
        Ok(())
    }

    /// Process one user turn.
    pub async fn run_turn(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<TurnOutcome, MnemoCoreError> {
        let _turn_guard = match &self.session_locks {
            Some(locks) => Some(locks.acquire(session_id).await),
            None => None,
        };
        info!(
            "turn started (session_id={}, query_len={})",
            session_id,
            query.len()
        );
        let mut warnings = Vec::new();

        let context = self.short_term.get_context(session_id).await?;

        let recalled = if self.trigger.should_recall(query) {
            match self.long_term.retrieve(query, self.top_k).await {
                Ok(records) => records,
                Err(err) => {
                    warn!("recall failed (session_id={}, err={})", session_id, err);
                    warnings.push(TurnWarning::RecallFailed(err.to_string()));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let prompt = compose_answer_prompt(&context, &recalled, query);
        let response = self.generator.generate(&prompt).await?;

        self.short_term
            .append_message(session_id, Role::User, query)
            .await?;
        self.short_term
            .append_message(session_id, Role::Assistant, response.clone())
            .await?;

        let summary_refreshed = match self.maybe_summarize(session_id).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(
                    "summarization failed (session_id={}, err={})",
                    session_id, err
                );
                warnings.push(TurnWarning::SummarizationFailed(err.to_string()));
                false
            }
        };

        let stored_fact_id = match self.trigger.should_persist(query) {
            Some(fact) => match self.store_fact(session_id, &fact).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!("fact write failed (session_id={}, err={})", session_id, err);
                    warnings.push(TurnWarning::FactWriteFailed(err.to_string()));
                    None
                }
            },
            None => None,
        };

        if let Err(err) = self.short_term.touch_access_time(session_id).await {
            warn!(
                "access time update failed (session_id={}, err={})",
                session_id, err
            );
            warnings.push(TurnWarning::AccessTouchFailed(err.to_string()));
        }

        info!(
            "turn finished (session_id={}, recalled={}, summary_refreshed={}, stored_fact={}, warnings={})",
            session_id,
            recalled.len(),
            summary_refreshed,
            stored_fact_id.is_some(),
            warnings.len()
        );
        Ok(TurnOutcome {
            session_id: session_id.to_string(),
            response,
            recalled,
            summary_refreshed,
            stored_fact_id,
            warnings,
        })
    }

    /// Retrieve long-term records for `query` without running a turn.
    pub async fn recall(&self, query: &str) -> Result<Vec<MemoryRecord>, MnemoCoreError> {
        Ok(self.long_term.retrieve(query, self.top_k).await?)
    }

    /// Persist a fact for `session_id` with the standard turn metadata.
    pub async fn remember(&self, session_id: &str, fact: &str) -> Result<String, MnemoCoreError> {
        Ok(self.store_fact(session_id, fact).await?)
    }

    /// Delete a session's log, summary and access time.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), MnemoCoreError> {
        Ok(self.short_term.clear_session(session_id).await?)
    }

    /// Drop every long-term record. Returns false when the index did not exist.
    pub async fn reset_long_term(&self) -> Result<bool, MnemoCoreError> {
        Ok(self.long_term.drop_all().await?)
    }

    async fn maybe_summarize(&self, session_id: &str) -> Result<bool, MemoryError> {
        let context = self.short_term.get_context(session_id).await?;
        if !context.has_summary_gap() {
            return Ok(false);
        }
        Ok(self
            .summarizer
            .refresh(&self.short_term, session_id)
            .await?
            .is_some())
    }

    async fn store_fact(&self, session_id: &str, fact: &str) -> Result<String, MemoryError> {
        self.long_term
            .store(fact, self.fact_metadata(session_id))
            .await
    }

    fn fact_metadata(&self, session_id: &str) -> Value {
        json!({
            "session_id": session_id,
            "kind": self.fact_kind,
            "timestamp": Utc::now().timestamp(),
        })
    }
}
