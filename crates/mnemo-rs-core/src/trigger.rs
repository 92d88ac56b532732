//! Replaceable heuristics deciding when a turn reads or writes long-term memory.

use crate::error::MnemoCoreError;
use mnemo_rs_config::TriggerConfig;
use regex::Regex;

/// Decides per query whether long-term memory is consulted or written.
///
/// The orchestrator only talks to this trait, so a classifier can replace
/// the keyword heuristics without touching turn handling.
pub trait MemoryTrigger: Send + Sync {
    /// Whether the query should retrieve long-term records.
    fn should_recall(&self, query: &str) -> bool;

    /// The fact text to persist, or `None` when the query is not a fact.
    fn should_persist(&self, query: &str) -> Option<String>;
}

/// Group name a persist pattern uses to capture the fact text.
pub const FACT_GROUP: &str = "fact";

/// Regex-backed trigger built from configured cue patterns.
///
/// A persist pattern with a `fact` group stores only the captured text, which
/// strips cue prefixes such as "please remember:". Without the group the
/// whole trimmed query is stored.
#[derive(Debug, Clone)]
pub struct RegexTrigger {
    recall: Vec<Regex>,
    persist: Vec<Regex>,
}

impl RegexTrigger {
    /// Compile recall and persist cues.
    pub fn new<R, P>(recall_patterns: R, persist_patterns: P) -> Result<Self, MnemoCoreError>
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let recall = recall_patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let persist = persist_patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { recall, persist })
    }

    /// Build a trigger from configuration.
    pub fn from_config(config: &TriggerConfig) -> Result<Self, MnemoCoreError> {
        Self::new(&config.recall_patterns, &config.persist_patterns)
    }
}

impl MemoryTrigger for RegexTrigger {
    fn should_recall(&self, query: &str) -> bool {
        self.recall.iter().any(|pattern| pattern.is_match(query))
    }

    fn should_persist(&self, query: &str) -> Option<String> {
        self.persist.iter().find_map(|pattern| {
            let captures = pattern.captures(query)?;
            let fact = captures
                .name(FACT_GROUP)
                .map(|group| group.as_str())
                .unwrap_or(query)
                .trim();
            (!fact.is_empty()).then(|| fact.to_string())
        })
    }
}

/// Trigger that never reads or writes long-term memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTrigger;

impl MemoryTrigger for NeverTrigger {
    fn should_recall(&self, _query: &str) -> bool {
        false
    }

    fn should_persist(&self, _query: &str) -> Option<String> {
        None
    }
}
