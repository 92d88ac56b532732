//! Errors raised while reading, parsing and checking configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by config loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read, or a required one is missing.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The working directory used to find the cwd layer could not be resolved.
    #[error("cannot resolve working directory {}: {source}", path.display())]
    Cwd {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid JSON5.
    #[error("{origin} is not valid JSON5: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// Schema-valid JSON did not decode into the config types.
    #[error("config does not decode: {0}")]
    Decode(#[from] serde_json::Error),
    /// One field holds an unusable value.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A rule spanning several fields was broken.
    #[error("invalid config: {0}")]
    Invalid(String),
}
