//! Configuration schema for Mnemo.

use serde::{Deserialize, Serialize};

/// Root config for the Mnemo SDK.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemoConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

impl MnemoConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MnemoConfigBuilder {
        MnemoConfigBuilder::new()
    }
}

/// Builder for assembling a `MnemoConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemoConfigBuilder {
    config: MnemoConfig,
}

impl MnemoConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MnemoConfig::default(),
        }
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Set the number of rounds kept verbatim.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.config.memory.window_size = window_size;
        self
    }

    /// Set the number of long-term records recalled per turn.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.memory.top_k = top_k;
        self
    }

    /// Replace the backing store configuration.
    pub fn backends(mut self, backends: BackendsConfig) -> Self {
        self.config.backends = backends;
        self
    }

    /// Replace the model configuration.
    pub fn models(mut self, models: ModelsConfig) -> Self {
        self.config.models = models;
        self
    }

    /// Finalize and return the built `MnemoConfig`.
    pub fn build(self) -> MnemoConfig {
        self.config
    }
}

/// Memory policy: window, recall, summarization, and trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub recall: MemoryRecallConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub serialize_session_turns: bool,
    #[serde(default = "default_fact_kind")]
    pub fact_kind: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            top_k: default_top_k(),
            summary: SummaryConfig::default(),
            recall: MemoryRecallConfig::default(),
            triggers: TriggerConfig::default(),
            serialize_session_turns: false,
            fact_kind: default_fact_kind(),
        }
    }
}

/// Default number of rounds kept verbatim.
fn default_window_size() -> usize {
    10
}

/// Default number of long-term records recalled.
fn default_top_k() -> usize {
    5
}

/// Default metadata kind for persisted facts.
fn default_fact_kind() -> String {
    "user_fact".to_string()
}

/// How aged rounds are folded into the cached summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStrategy {
    /// Re-summarize every aged round on each refresh.
    #[default]
    FromScratch,
    /// Summarize the previous summary plus newly aged rounds.
    Incremental,
}

/// Summary generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummaryConfig {
    #[serde(default)]
    pub strategy: SummaryStrategy,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

/// Recall mode selection for long-term search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryRecallMode {
    Text,
    Vector,
    #[default]
    Hybrid,
}

/// Long-term recall weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecallConfig {
    #[serde(default)]
    pub mode: MemoryRecallMode,
    #[serde(default = "default_text_weight")]
    pub text_weight: f32,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,
    #[serde(default)]
    pub min_score: Option<f32>,
}

impl Default for MemoryRecallConfig {
    fn default() -> Self {
        Self {
            mode: MemoryRecallMode::default(),
            text_weight: default_text_weight(),
            vector_weight: default_vector_weight(),
            min_score: None,
        }
    }
}

/// Default lexical weight for recall scoring.
fn default_text_weight() -> f32 {
    0.5
}

/// Default vector similarity weight for recall scoring.
fn default_vector_weight() -> f32 {
    0.5
}

/// Cue patterns deciding when to read or write long-term memory.
///
/// Persist patterns may capture the fact text in a group named `fact`;
/// without it the whole query is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_recall_patterns")]
    pub recall_patterns: Vec<String>,
    #[serde(default = "default_persist_patterns")]
    pub persist_patterns: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            recall_patterns: default_recall_patterns(),
            persist_patterns: default_persist_patterns(),
        }
    }
}

/// Default recall cues.
fn default_recall_patterns() -> Vec<String> {
    vec![
        r"(?i)\bremember\b".to_string(),
        r"(?i)\bmy\b".to_string(),
        "记住".to_string(),
        "我的".to_string(),
    ]
}

/// Default persist cues, first match wins.
///
/// A leading cue is stripped from the stored fact; `请记住` anywhere else in
/// the query stores the whole query.
fn default_persist_patterns() -> Vec<String> {
    vec![
        r"(?i)^\s*please\s+remember(?:\s+that)?\s*[:：,]?\s*(?P<fact>.+)$".to_string(),
        r"^\s*请记住\s*[:：]?\s*(?P<fact>.+)$".to_string(),
        "请记住".to_string(),
    ]
}

/// Backing store endpoints.
///
/// Recognized schemes are `memory://` and `sqlite://<path>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default = "default_endpoint")]
    pub backing_store_endpoint: String,
    #[serde(default = "default_endpoint")]
    pub search_store_endpoint: String,
    #[serde(default = "default_search_index")]
    pub search_index: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            backing_store_endpoint: default_endpoint(),
            search_store_endpoint: default_endpoint(),
            search_index: default_search_index(),
        }
    }
}

/// Default process-local endpoint.
fn default_endpoint() -> String {
    "memory://".to_string()
}

/// Default long-term index name.
fn default_search_index() -> String {
    "mnemo_memory".to_string()
}

/// Model references for the embedding and generation ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub embedding_model_ref: Option<String>,
    #[serde(default)]
    pub generation_model_ref: Option<String>,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            embedding_model_ref: None,
            generation_model_ref: None,
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// Default generation timeout in seconds.
fn default_generation_timeout_secs() -> u64 {
    60
}
