//! Process-local backends for tests and single-process deployments.

use super::{
    HybridQuery, IndexedDocument, KeyValueBackend, SearchBackend, SearchHit, resolve_range,
};
use crate::error::MemoryError;
use crate::scoring::rank_documents;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Entry {
    List(Vec<Vec<u8>>),
    Value(Vec<u8>),
}

/// Key-value backend held in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryKeyValue {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryKeyValue {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }
}

fn wrong_type(key: &str) -> MemoryError {
    MemoryError::StoreUnavailable(format!("wrong value type at key {key}"))
}

#[async_trait]
impl KeyValueBackend for InMemoryKeyValue {
    async fn push(&self, key: &str, value: Vec<u8>) -> Result<usize, MemoryError> {
        let mut entries = self.entries.write();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(Vec::new()));
        match entry {
            Entry::List(items) => {
                items.push(value);
                Ok(items.len())
            }
            Entry::Value(_) => Err(wrong_type(key)),
        }
    }

    async fn range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>, MemoryError> {
        let entries = self.entries.read();
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(items)) => Ok(resolve_range(items.len(), start, stop)
                .map(|(start, stop)| items[start..=stop].to_vec())
                .unwrap_or_default()),
            Some(Entry::Value(_)) => Err(wrong_type(key)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MemoryError> {
        match self.entries.read().get(key) {
            None => Ok(None),
            Some(Entry::Value(value)) => Ok(Some(value.clone())),
            Some(Entry::List(_)) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), MemoryError> {
        self.entries
            .write()
            .insert(key.to_string(), Entry::Value(value));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, MemoryError> {
        let mut entries = self.entries.write();
        let removed = keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed)
    }
}

/// Search index held in a process-local map. Documents keep insertion order.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    indices: RwLock<HashMap<String, Vec<(String, Value)>>>,
}

impl InMemorySearchIndex {
    /// Create an empty set of indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index.
    pub fn document_count(&self, index: &str) -> usize {
        self.indices.read().get(index).map_or(0, Vec::len)
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchIndex {
    async fn ensure_index(&self, index: &str) -> Result<(), MemoryError> {
        self.indices.write().entry(index.to_string()).or_default();
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, MemoryError> {
        Ok(self.indices.read().contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<bool, MemoryError> {
        Ok(self.indices.write().remove(index).is_some())
    }

    async fn upsert(&self, index: &str, document: IndexedDocument) -> Result<(), MemoryError> {
        let mut indices = self.indices.write();
        let documents = indices.entry(index.to_string()).or_default();
        match documents.iter_mut().find(|(id, _)| *id == document.id) {
            Some(existing) => existing.1 = document.source,
            None => documents.push((document.id, document.source)),
        }
        Ok(())
    }

    async fn hybrid_query(
        &self,
        index: &str,
        query: &HybridQuery,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        let indices = self.indices.read();
        let Some(documents) = indices.get(index) else {
            debug!("hybrid query on missing index (index={index})");
            return Ok(Vec::new());
        };
        Ok(rank_documents(
            query,
            documents.iter().map(|(id, source)| (id.as_str(), source)),
        ))
    }
}
