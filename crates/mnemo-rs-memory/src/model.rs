//! Data model shared by the short-term and long-term stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role for a session message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a session's append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Write time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Cached compression of the rounds older than the retained window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    /// Summary text.
    pub text: String,
    /// Total rounds in the session when the summary was generated.
    pub generated_at_turn_count: usize,
    /// Number of aged rounds the summary covers.
    pub covered_rounds: usize,
    /// Generation time.
    pub created_at: DateTime<Utc>,
}

impl Summary {
    /// Build a summary stamped with the current time.
    pub fn new(
        text: impl Into<String>,
        generated_at_turn_count: usize,
        covered_rounds: usize,
    ) -> Self {
        Self {
            text: text.into(),
            generated_at_turn_count,
            covered_rounds,
            created_at: Utc::now(),
        }
    }
}

/// Result of reading a session's short-term memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /// The most recent `min(total_rounds, window)` rounds, plus a dangling
    /// message if the log has odd length.
    pub recent: Vec<Message>,
    /// Cached summary of older rounds, only present once the window overflows.
    pub summary: Option<Summary>,
    /// Completed rounds in the full log.
    pub total_rounds: usize,
    /// Window size the context was cut with.
    pub window_size: usize,
}

impl SessionContext {
    /// Context for a session with no messages.
    pub fn empty(window_size: usize) -> Self {
        Self {
            recent: Vec::new(),
            summary: None,
            total_rounds: 0,
            window_size,
        }
    }

    /// Number of rounds that fall outside the retained window.
    pub fn aged_rounds(&self) -> usize {
        self.total_rounds.saturating_sub(self.window_size)
    }

    /// Summary text, if a non-empty summary is cached.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary
            .as_ref()
            .map(|summary| summary.text.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    /// True when aged rounds exist that no cached summary covers yet.
    pub fn has_summary_gap(&self) -> bool {
        let aged = self.aged_rounds();
        if aged == 0 {
            return false;
        }
        match &self.summary {
            Some(summary) => summary.covered_rounds < aged,
            None => true,
        }
    }
}

/// Rounds that have left the window, read together with the log size.
#[derive(Debug, Clone, PartialEq)]
pub struct AgedHistory {
    /// Messages of the aged rounds, oldest first.
    pub messages: Vec<Message>,
    /// Completed rounds in the full log at read time.
    pub total_rounds: usize,
}

impl AgedHistory {
    pub fn rounds(&self) -> usize {
        self.messages.len() / 2
    }
}

/// Long-term, semantically indexed memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Record identifier generated on write.
    pub id: String,
    /// Record content.
    pub content: String,
    /// Embedding of `content`.
    pub embedding: Vec<f32>,
    /// Free-form metadata (session id, kind, timestamp, ...).
    pub metadata: serde_json::Value,
    /// Combined relevance score, only set on retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}
