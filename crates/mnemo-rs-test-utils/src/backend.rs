//! Backing stores that fail on demand.

use async_trait::async_trait;
use mnemo_rs_memory::{
    HybridQuery, IndexedDocument, KeyValueBackend, MemoryError, SearchBackend, SearchHit,
};

/// Key-value backend whose service is never reachable.
#[derive(Debug, Clone, Default)]
pub struct UnavailableKeyValue;

impl UnavailableKeyValue {
    pub fn new() -> Self {
        Self
    }
}

fn unreachable_store() -> MemoryError {
    MemoryError::StoreUnavailable("connection refused".to_string())
}

#[async_trait]
impl KeyValueBackend for UnavailableKeyValue {
    async fn ping(&self) -> Result<(), MemoryError> {
        Err(unreachable_store())
    }

    async fn push(&self, _key: &str, _value: Vec<u8>) -> Result<usize, MemoryError> {
        Err(unreachable_store())
    }

    async fn range(
        &self,
        _key: &str,
        _start: i64,
        _stop: i64,
    ) -> Result<Vec<Vec<u8>>, MemoryError> {
        Err(unreachable_store())
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, MemoryError> {
        Err(unreachable_store())
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), MemoryError> {
        Err(unreachable_store())
    }

    async fn delete(&self, _keys: &[String]) -> Result<usize, MemoryError> {
        Err(unreachable_store())
    }
}

/// Search backend that fails every read and write.
#[derive(Debug, Clone, Default)]
pub struct FailingSearchIndex;

impl FailingSearchIndex {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchBackend for FailingSearchIndex {
    async fn ensure_index(&self, _index: &str) -> Result<(), MemoryError> {
        Err(unreachable_store())
    }

    async fn index_exists(&self, _index: &str) -> Result<bool, MemoryError> {
        Err(unreachable_store())
    }

    async fn delete_index(&self, _index: &str) -> Result<bool, MemoryError> {
        Err(unreachable_store())
    }

    async fn upsert(&self, _index: &str, _document: IndexedDocument) -> Result<(), MemoryError> {
        Err(unreachable_store())
    }

    async fn hybrid_query(
        &self,
        _index: &str,
        _query: &HybridQuery,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        Err(unreachable_store())
    }
}
