//! Builder for assembling an `Orchestrator` from explicit parts.

use super::Orchestrator;
use super::locks::SessionLocks;
use crate::error::MnemoCoreError;
use crate::summarizer::Summarizer;
use crate::trigger::{MemoryTrigger, RegexTrigger};
use mnemo_rs_config::{SummaryConfig, TriggerConfig};
use mnemo_rs_memory::{LongTermStore, ShortTermStore};
use mnemo_rs_protocol::GenerationPort;
use std::sync::Arc;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_FACT_KIND: &str = "user_fact";

/// Builder for `Orchestrator`.
///
/// Both stores and the answer generator are required. The summary generator
/// defaults to the answer generator and the trigger defaults to the built-in
/// cue patterns.
#[derive(Default)]
pub struct OrchestratorBuilder {
    short_term: Option<ShortTermStore>,
    long_term: Option<LongTermStore>,
    generator: Option<Arc<dyn GenerationPort>>,
    summary_generator: Option<Arc<dyn GenerationPort>>,
    summary: SummaryConfig,
    trigger: Option<Arc<dyn MemoryTrigger>>,
    top_k: Option<usize>,
    fact_kind: Option<String>,
    serialize_session_turns: bool,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn short_term(mut self, store: ShortTermStore) -> Self {
        self.short_term = Some(store);
        self
    }

    pub fn long_term(mut self, store: LongTermStore) -> Self {
        self.long_term = Some(store);
        self
    }

    /// Generator used to answer turns.
    pub fn generator(mut self, generator: Arc<dyn GenerationPort>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Separate generator for summaries.
    pub fn summary_generator(mut self, generator: Arc<dyn GenerationPort>) -> Self {
        self.summary_generator = Some(generator);
        self
    }

    pub fn summary(mut self, summary: SummaryConfig) -> Self {
        self.summary = summary;
        self
    }

    pub fn trigger(mut self, trigger: Arc<dyn MemoryTrigger>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Number of long-term records recalled per turn.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Metadata `kind` written with persisted facts.
    pub fn fact_kind(mut self, kind: impl Into<String>) -> Self {
        self.fact_kind = Some(kind.into());
        self
    }

    /// Allow only one in-flight turn per session.
    pub fn serialize_session_turns(mut self, enabled: bool) -> Self {
        self.serialize_session_turns = enabled;
        self
    }

    pub fn build(self) -> Result<Orchestrator, MnemoCoreError> {
        let short_term = self
            .short_term
            .ok_or(MnemoCoreError::MissingComponent("short-term store"))?;
        let long_term = self
            .long_term
            .ok_or(MnemoCoreError::MissingComponent("long-term store"))?;
        let generator = self
            .generator
            .ok_or(MnemoCoreError::MissingComponent("generation port"))?;
        let trigger = match self.trigger {
            Some(trigger) => trigger,
            None => Arc::new(RegexTrigger::from_config(&TriggerConfig::default())?),
        };
        let summary_generator = self.summary_generator.unwrap_or_else(|| generator.clone());
        let summarizer = Summarizer::from_config(summary_generator, &self.summary);
        Ok(Orchestrator {
            short_term,
            long_term,
            generator,
            summarizer,
            trigger,
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            fact_kind: self
                .fact_kind
                .unwrap_or_else(|| DEFAULT_FACT_KIND.to_string()),
            session_locks: self.serialize_session_turns.then(SessionLocks::new),
        })
    }
}
