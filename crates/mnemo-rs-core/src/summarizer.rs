//! Rolling summary generation for rounds that leave the short-term window.

use crate::prompt::{
    compose_incremental_summary_prompt, compose_summary_prompt, render_transcript,
};
use log::{debug, info};
use mnemo_rs_config::{SummaryConfig, SummaryStrategy};
use mnemo_rs_memory::{MemoryError, ShortTermStore, Summary};
use mnemo_rs_protocol::GenerationPort;
use std::sync::Arc;

/// Regenerates a session's cached summary through the generation port.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn GenerationPort>,
    strategy: SummaryStrategy,
    max_chars: Option<usize>,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("strategy", &self.strategy)
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    pub fn new(generator: Arc<dyn GenerationPort>, strategy: SummaryStrategy) -> Self {
        Self {
            generator,
            strategy,
            max_chars: None,
        }
    }

    pub fn from_config(generator: Arc<dyn GenerationPort>, config: &SummaryConfig) -> Self {
        Self::new(generator, config.strategy).with_max_chars(config.max_chars)
    }

    /// Cap the stored summary length in characters.
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn strategy(&self) -> SummaryStrategy {
        self.strategy
    }

    /// Summarize every round older than the window and replace the cached summary.
    ///
    /// Returns `None` when no round has aged out yet. With the incremental
    /// strategy only rounds the previous summary does not cover are sent,
    /// together with that summary; otherwise the whole aged history is sent.
    /// A blank generation is an error and leaves the cached summary untouched.
    pub async fn refresh(
        &self,
        store: &ShortTermStore,
        session_id: &str,
    ) -> Result<Option<Summary>, MemoryError> {
        let aged = store.aged_history(session_id).await?;
        let aged_rounds = aged.rounds();
        if aged_rounds == 0 {
            return Ok(None);
        }

        let previous = match self.strategy {
            SummaryStrategy::Incremental => store.summary(session_id).await?,
            SummaryStrategy::FromScratch => None,
        };
        let prompt = match previous {
            Some(previous)
                if previous.covered_rounds > 0
                    && previous.covered_rounds < aged_rounds
                    && !previous.text.trim().is_empty() =>
            {
                let fresh = &aged.messages[previous.covered_rounds * 2..];
                debug!(
                    "incremental summary (session_id={}, covered={}, new_rounds={})",
                    session_id,
                    previous.covered_rounds,
                    aged_rounds - previous.covered_rounds
                );
                compose_incremental_summary_prompt(&previous.text, &render_transcript(fresh))
            }
            _ => compose_summary_prompt(&render_transcript(&aged.messages)),
        };

        let text = self.generator.generate(&prompt).await?;
        let text = self.truncate(text.trim());
        if text.is_empty() {
            return Err(MemoryError::GenerationFailed("empty summary".to_string()));
        }
        let summary = Summary::new(text, aged.total_rounds, aged_rounds);
        store.save_summary(session_id, &summary).await?;
        info!(
            "summary refreshed (session_id={}, covered_rounds={}, strategy={:?})",
            session_id, aged_rounds, self.strategy
        );
        Ok(Some(summary))
    }

    fn truncate(&self, text: &str) -> String {
        match self.max_chars {
            Some(max) if text.chars().count() > max => text.chars().take(max).collect(),
            _ => text.to_string(),
        }
    }
}
