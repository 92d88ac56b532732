//! Config to runtime mapping for memory options.

use mnemo_rs_config::MemoryRecallMode;
use mnemo_rs_memory::MemoryRecallOptions;

/// Translate recall config into long-term store options.
pub(crate) fn recall_options_from_config(
    config: &mnemo_rs_config::MemoryRecallConfig,
) -> MemoryRecallOptions {
    MemoryRecallOptions {
        mode: recall_mode_from_config(config.mode),
        text_weight: config.text_weight,
        vector_weight: config.vector_weight,
        min_score: config.min_score,
    }
}

fn recall_mode_from_config(mode: MemoryRecallMode) -> mnemo_rs_memory::MemoryRecallMode {
    match mode {
        MemoryRecallMode::Text => mnemo_rs_memory::MemoryRecallMode::Text,
        MemoryRecallMode::Vector => mnemo_rs_memory::MemoryRecallMode::Vector,
        MemoryRecallMode::Hybrid => mnemo_rs_memory::MemoryRecallMode::Hybrid,
    }
}

#[cfg(test)]
mod tests {
    use super::recall_options_from_config;
    use mnemo_rs_config::{MemoryRecallConfig, MemoryRecallMode};
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_mode_and_weights() {
        let config = MemoryRecallConfig {
            mode: MemoryRecallMode::Vector,
            text_weight: 0.2,
            vector_weight: 0.8,
            min_score: Some(0.1),
        };
        let options = recall_options_from_config(&config);
        assert_eq!(options.mode, mnemo_rs_memory::MemoryRecallMode::Vector);
        assert_eq!(options.effective_weights(), (0.0, 0.8));
        assert_eq!(options.min_score, Some(0.1));
    }
}
