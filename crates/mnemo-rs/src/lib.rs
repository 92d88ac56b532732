//! Mnemo SDK: tiered conversational memory for LLM agents.
//!
//! Most callers only need [`open`]: it loads the layered `mnemo.json5`
//! stack for a working directory, builds the orchestrator over the
//! configured backends and checks they are reachable. The underlying crates
//! are re-exported for anything finer grained.

pub use mnemo_rs_config as config;
pub use mnemo_rs_core as core;
pub use mnemo_rs_memory as memory;
pub use mnemo_rs_protocol as protocol;

pub use mnemo_rs_config::MnemoConfig;
pub use mnemo_rs_core::{MnemoCoreError, Orchestrator, TurnOutcome, TurnWarning};
pub use mnemo_rs_protocol::{EmbeddingPort, GenerationPort};

use log::info;
use mnemo_rs_config::LayeredConfigOptions;
use std::sync::Arc;

/// Wire `env_logger` when the `logging` feature is on; otherwise only the
/// `log` facade is used and output is up to the host application.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
    log::debug!("mnemo logging initialized");
}

/// Load layered config for `options`, build the orchestrator and prepare its backends.
pub async fn open(
    options: LayeredConfigOptions,
    embedder: Arc<dyn EmbeddingPort>,
    generator: Arc<dyn GenerationPort>,
) -> Result<Orchestrator, MnemoCoreError> {
    let layered = MnemoConfig::load_layered_with_options(options)?;
    info!(
        "opening mnemo (layers={}, window_size={}, backing_store={})",
        layered.layers.len(),
        layered.config.memory.window_size,
        layered.config.backends.backing_store_endpoint
    );
    let orchestrator = Orchestrator::from_config(&layered.config, embedder, generator)?;
    orchestrator.prepare().await?;
    Ok(orchestrator)
}
