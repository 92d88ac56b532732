//! Backing-store construction from configured endpoints.

use crate::error::MnemoCoreError;
use log::info;
use mnemo_rs_memory::{
    InMemoryKeyValue, InMemorySearchIndex, KeyValueBackend, SearchBackend, SqliteKeyValue,
    SqliteSearchIndex,
};
use std::path::PathBuf;
use std::sync::Arc;

const MEMORY_SCHEME: &str = "memory://";
const SQLITE_SCHEME: &str = "sqlite://";
const SQLITE_IN_MEMORY: &str = ":memory:";

/// A parsed backing-store endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Process-local store, lost on drop.
    Memory,
    /// SQLite database; `None` opens a private in-memory database.
    Sqlite(Option<PathBuf>),
}

impl Endpoint {
    /// Parse `memory://` or `sqlite://<path>`.
    pub fn parse(raw: &str) -> Result<Self, MnemoCoreError> {
        let raw = raw.trim();
        if raw == MEMORY_SCHEME || raw == "memory" {
            return Ok(Endpoint::Memory);
        }
        if let Some(path) = raw.strip_prefix(SQLITE_SCHEME) {
            return match path {
                "" => Err(MnemoCoreError::UnsupportedEndpoint(format!(
                    "{raw} (missing database path)"
                ))),
                SQLITE_IN_MEMORY => Ok(Endpoint::Sqlite(None)),
                path => Ok(Endpoint::Sqlite(Some(PathBuf::from(path)))),
            };
        }
        Err(MnemoCoreError::UnsupportedEndpoint(raw.to_string()))
    }
}

/// Open the key-value backend for the short-term store.
pub fn key_value_backend(endpoint: &str) -> Result<Arc<dyn KeyValueBackend>, MnemoCoreError> {
    let backend: Arc<dyn KeyValueBackend> = match Endpoint::parse(endpoint)? {
        Endpoint::Memory => Arc::new(InMemoryKeyValue::new()),
        Endpoint::Sqlite(None) => Arc::new(SqliteKeyValue::open_in_memory()?),
        Endpoint::Sqlite(Some(path)) => {
            create_parent_dir(&path)?;
            Arc::new(SqliteKeyValue::open(&path)?)
        }
    };
    info!("key-value backend ready (endpoint={})", endpoint);
    Ok(backend)
}

/// Open the search backend for the long-term store.
pub fn search_backend(endpoint: &str) -> Result<Arc<dyn SearchBackend>, MnemoCoreError> {
    let backend: Arc<dyn SearchBackend> = match Endpoint::parse(endpoint)? {
        Endpoint::Memory => Arc::new(InMemorySearchIndex::new()),
        Endpoint::Sqlite(None) => Arc::new(SqliteSearchIndex::open_in_memory()?),
        Endpoint::Sqlite(Some(path)) => {
            create_parent_dir(&path)?;
            Arc::new(SqliteSearchIndex::open(&path)?)
        }
    };
    info!("search backend ready (endpoint={})", endpoint);
    Ok(backend)
}

fn create_parent_dir(path: &std::path::Path) -> Result<(), MnemoCoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| {
            MnemoCoreError::UnsupportedEndpoint(format!("{}: {err}", path.display()))
        })?;
    }
    Ok(())
}
