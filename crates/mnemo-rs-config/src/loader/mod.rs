//! Layered configuration loading.
//!
//! A config is assembled from up to four JSON5 files, lowest precedence
//! first: system, user, the working directory's `mnemo.json5`, then any
//! runtime overrides. Every file is schema-checked on its own, the layers are
//! overlaid, and the merged result is validated as a whole.

mod layer_io;
mod merge;
mod schema;


use crate::{ConfigError, MnemoConfig};
use log::{debug, info};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "mnemo.json5";
const DEFAULT_CONFIG_DIR: &str = ".mnemo";
const SYSTEM_CONFIG_PATH: &str = "/etc/mnemo/mnemo.json5";

/// Merged config plus the layers it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: MnemoConfig,
    /// Layers that were found and applied, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    Cwd,
    /// Explicit override files; always applied last and must exist.
    Runtime,
}

impl ConfigLayerSource {
    /// Short name used in log lines and error paths.
    pub fn label(&self) -> &'static str {
        match self {
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// A layer that was applied.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: Option<PathBuf>,
}

/// Where to look for layers.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory holding the cwd layer.
    pub cwd: PathBuf,
    /// System layer; `/etc/mnemo/mnemo.json5` on Unix by default.
    pub system_config_path: Option<PathBuf>,
    /// User layer; `~/.mnemo/mnemo.json5` by default.
    pub user_config_path: Option<PathBuf>,
    /// Override files, applied in order after every other layer.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Default system and user locations plus the cwd layer under `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layer_io::system_config_path(),
            user_config_path: layer_io::user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Only the cwd layer and explicit overrides; host-wide files are ignored.
    pub fn isolated(cwd: impl AsRef<Path>) -> Self {
        Self {
            system_config_path: None,
            user_config_path: None,
            ..Self::new(cwd)
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    fn candidates(&self, cwd: &Path) -> Vec<LayerCandidate> {
        let optional = |source, path: &Option<PathBuf>| {
            path.clone().map(|path| LayerCandidate {
                source,
                path,
                required: false,
            })
        };
        let mut candidates: Vec<LayerCandidate> = [
            optional(ConfigLayerSource::System, &self.system_config_path),
            optional(ConfigLayerSource::User, &self.user_config_path),
            optional(
                ConfigLayerSource::Cwd,
                &Some(cwd.join(DEFAULT_CONFIG_FILE)),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();
        candidates.extend(self.runtime_paths.iter().map(|path| LayerCandidate {
            source: ConfigLayerSource::Runtime,
            path: path.clone(),
            required: true,
        }));
        candidates
    }
}

/// A file that may contribute a layer.
#[derive(Debug, Clone)]
struct LayerCandidate {
    source: ConfigLayerSource,
    path: PathBuf,
    required: bool,
}

/// A parsed, schema-checked layer waiting to be merged.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

impl MnemoConfig {
    /// Load one JSON5 file with no layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config (path={})", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        decode(layer_io::parse_json5(&contents, &origin)?, &origin)
    }

    /// Load JSON5 text with no layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from text (len={})", contents.len());
        decode(layer_io::parse_json5(contents, "config")?, "config")
    }

    /// Load the layer stack at the default locations for `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layer stack described by `options`.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::resolve_cwd(&options.cwd)?;
        let mut seen = HashSet::new();
        let mut merged = Value::Object(Map::new());
        let mut layers = Vec::new();

        for candidate in options.candidates(&cwd) {
            let Some(layer) = layer_io::read_layer(&candidate)? else {
                continue;
            };
            if !seen.insert(layer_io::file_identity(&candidate.path)) {
                debug!(
                    "config layer already applied (source={}, path={})",
                    candidate.source.label(),
                    candidate.path.display()
                );
                continue;
            }
            let values = merge::overlay(&mut merged, &layer.value);
            debug!(
                "applied config layer (source={}, values={})",
                candidate.source.label(),
                values
            );
            layers.push(layer.meta);
        }

        let config = decode(merged, "effective")?;
        info!(
            "layered config loaded (cwd={}, layers={})",
            cwd.display(),
            layers.len()
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Check the rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let memory = &self.memory;
        let at_least_one = [
            ("memory.window_size", memory.window_size as u64),
            ("memory.top_k", memory.top_k as u64),
            (
                "models.generation_timeout_secs",
                self.models.generation_timeout_secs,
            ),
        ];
        if let Some((name, _)) = at_least_one.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }
        if memory.recall.text_weight < 0.0 || memory.recall.vector_weight < 0.0 {
            return Err(ConfigError::Invalid(
                "memory.recall weights must not be negative".to_string(),
            ));
        }
        if memory.fact_kind.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "memory.fact_kind must not be empty".to_string(),
            ));
        }
        let triggers = &memory.triggers;
        for (name, patterns) in [
            ("recall_patterns", &triggers.recall_patterns),
            ("persist_patterns", &triggers.persist_patterns),
        ] {
            for (idx, pattern) in patterns.iter().enumerate() {
                Regex::new(pattern).map_err(|err| ConfigError::InvalidField {
                    path: format!("memory.triggers.{name}[{idx}]"),
                    message: err.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

/// Schema-check, deserialize and validate a parsed value.
fn decode(value: Value, origin: &str) -> Result<MnemoConfig, ConfigError> {
    schema::validate_layer_schema(&value, origin)?;
    let config: MnemoConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
