//! Mnemo configuration: the memory policy, backend endpoints and model
//! references, read from layered JSON5 files or built in code.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
