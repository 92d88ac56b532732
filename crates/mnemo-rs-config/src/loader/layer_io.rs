//! Reading config layers from disk.

use super::{
    ConfigLayer, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayerCandidate, LoadedLayer,
    SYSTEM_CONFIG_PATH, schema,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read, parse and schema-check one layer.
///
/// A missing optional layer yields `None`; a missing required one is an error.
pub(super) fn read_layer(candidate: &LayerCandidate) -> Result<Option<LoadedLayer>, ConfigError> {
    let contents = match fs::read_to_string(&candidate.path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound && !candidate.required => {
            debug!(
                "config layer absent (source={}, path={})",
                candidate.source.label(),
                candidate.path.display()
            );
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: candidate.path.clone(),
                source,
            });
        }
    };
    let origin = format!(
        "{}({})",
        candidate.source.label(),
        candidate.path.display()
    );
    let value = parse_json5(&contents, &origin)?;
    schema::validate_layer_schema(&value, &origin)?;
    Ok(Some(LoadedLayer {
        meta: ConfigLayer {
            source: candidate.source,
            path: Some(candidate.path.clone()),
        },
        value,
    }))
}

/// Parse JSON5 text, naming `origin` on failure.
pub(super) fn parse_json5(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        origin: origin.to_string(),
        source,
    })
}

/// `/etc/mnemo/mnemo.json5` on Unix.
pub(super) fn system_config_path() -> Option<PathBuf> {
    cfg!(unix).then(|| PathBuf::from(SYSTEM_CONFIG_PATH))
}

/// `~/.mnemo/mnemo.json5`, when a home directory is known.
pub(super) fn user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(dirs.home_dir().join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Canonical working directory; kept as given when it does not exist yet.
pub(super) fn resolve_cwd(cwd: &Path) -> Result<PathBuf, ConfigError> {
    match cwd.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(cwd.to_path_buf()),
        Err(source) => Err(ConfigError::Cwd {
            path: cwd.to_path_buf(),
            source,
        }),
    }
}

/// Identity used to load a file only once when two sources point at it.
pub(super) fn file_identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
