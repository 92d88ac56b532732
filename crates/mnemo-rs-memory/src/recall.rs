//! Long-term recall configuration.

/// Recall modes supported by the search backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRecallMode {
    /// Lexical match on content only.
    Text,
    /// Vector similarity only.
    Vector,
    /// Lexical OR vector similarity, combined into one score.
    Hybrid,
}

/// Recall options for long-term retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryRecallOptions {
    /// Recall mode to use.
    pub mode: MemoryRecallMode,
    /// Weight applied to the lexical score.
    pub text_weight: f32,
    /// Weight applied to the vector similarity.
    pub vector_weight: f32,
    /// Optional minimum combined score a hit must reach.
    pub min_score: Option<f32>,
}

impl MemoryRecallOptions {
    /// Effective (text, vector) weights after applying the mode.
    pub fn effective_weights(&self) -> (f32, f32) {
        let text = self.text_weight.max(0.0);
        let vector = self.vector_weight.max(0.0);
        match self.mode {
            MemoryRecallMode::Text => (text, 0.0),
            MemoryRecallMode::Vector => (0.0, vector),
            MemoryRecallMode::Hybrid => (text, vector),
        }
    }
}

impl Default for MemoryRecallOptions {
    /// Default recall options.
    fn default() -> Self {
        Self {
            mode: MemoryRecallMode::Hybrid,
            text_weight: 0.5,
            vector_weight: 0.5,
            min_score: None,
        }
    }
}
