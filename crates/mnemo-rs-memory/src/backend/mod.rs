//! Backing-store contracts used by the memory stores.
//!
//! The short-term store needs list append/range and single-value get/set on
//! opaque byte payloads. The long-term store needs a document index that can
//! answer hybrid (lexical OR vector) queries. Both are network services in
//! production; the bundled implementations are process-local and SQLite.

mod memory;
mod sqlite;

pub use memory::{InMemoryKeyValue, InMemorySearchIndex};
pub use sqlite::{SqliteKeyValue, SqliteSearchIndex};

use crate::error::MemoryError;
use async_trait::async_trait;
use serde_json::Value;

/// Key-value service backing the short-term store.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Check the service is reachable.
    async fn ping(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    /// Append a value to the list at `key`, creating it if absent.
    /// Returns the list length after the append.
    async fn push(&self, key: &str, value: Vec<u8>) -> Result<usize, MemoryError>;

    /// Read list items between `start` and `stop` inclusive.
    /// Negative indices count from the end (`-1` is the last item).
    async fn range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>, MemoryError>;

    /// Read a single value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MemoryError>;

    /// Overwrite a single value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), MemoryError>;

    /// Delete every listed key in one atomic step. Returns how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize, MemoryError>;
}

/// A complete document written to a search index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    /// Document identifier.
    pub id: String,
    /// Document source with text, vector, and metadata fields.
    pub source: Value,
}

/// Hybrid query: lexical match on one field OR vector similarity on another.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridQuery {
    /// Raw query text for lexical matching.
    pub text: String,
    /// Query embedding for vector similarity.
    pub vector: Vec<f32>,
    /// Field holding the document text.
    pub text_field: String,
    /// Field holding the document vector.
    pub vector_field: String,
    /// Maximum number of hits.
    pub top_k: usize,
    /// Weight of the lexical score in the combined score.
    pub text_weight: f32,
    /// Weight of the vector similarity in the combined score.
    pub vector_weight: f32,
    /// Optional minimum combined score.
    pub min_score: Option<f32>,
}

/// A scored hit returned by a search backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Document identifier.
    pub id: String,
    /// Raw document source as stored.
    pub source: Value,
    /// Combined score.
    pub score: f32,
}

/// Document index backing the long-term store.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Create the index if it does not exist.
    async fn ensure_index(&self, index: &str) -> Result<(), MemoryError>;

    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, MemoryError>;

    /// Delete the index and every document in it. Returns false when absent.
    async fn delete_index(&self, index: &str) -> Result<bool, MemoryError>;

    /// Write one complete document. Readers never observe a partial write.
    async fn upsert(&self, index: &str, document: IndexedDocument) -> Result<(), MemoryError>;

    /// Run a hybrid query, best hits first. A missing index yields no hits.
    async fn hybrid_query(
        &self,
        index: &str,
        query: &HybridQuery,
    ) -> Result<Vec<SearchHit>, MemoryError>;
}

/// Resolve Redis-style inclusive range indices against a list length.
pub(crate) fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
