//! Result payload for a single turn.

use mnemo_rs_memory::MemoryRecord;

/// A non-fatal degradation that happened during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnWarning {
    /// Long-term retrieval failed; the turn ran without long-term context.
    RecallFailed(String),
    /// Summary regeneration failed; the previous summary (if any) was kept.
    SummarizationFailed(String),
    /// The fact could not be written to long-term memory.
    FactWriteFailed(String),
    /// The last-access telemetry could not be updated.
    AccessTouchFailed(String),
}

impl std::fmt::Display for TurnWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnWarning::RecallFailed(err) => write!(f, "recall failed: {err}"),
            TurnWarning::SummarizationFailed(err) => write!(f, "summarization failed: {err}"),
            TurnWarning::FactWriteFailed(err) => write!(f, "fact write failed: {err}"),
            TurnWarning::AccessTouchFailed(err) => write!(f, "access touch failed: {err}"),
        }
    }
}

/// Everything a caller learns from one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Session the turn belongs to.
    pub session_id: String,
    /// Assistant response, already appended to short-term memory.
    pub response: String,
    /// Long-term records injected into the prompt.
    pub recalled: Vec<MemoryRecord>,
    /// Whether the cached summary was regenerated after this turn.
    pub summary_refreshed: bool,
    /// Id of the long-term record written for this turn, if any.
    pub stored_fact_id: Option<String>,
    /// Non-fatal failures, in the order they happened.
    pub warnings: Vec<TurnWarning>,
}

impl TurnOutcome {
    /// True when the turn completed without any degradation.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
