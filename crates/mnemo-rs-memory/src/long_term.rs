//! Cross-session fact store over a hybrid search index.

use crate::backend::{HybridQuery, IndexedDocument, SearchBackend, SearchHit};
use crate::error::MemoryError;
use crate::model::MemoryRecord;
use crate::recall::MemoryRecallOptions;
use crate::scoring::vector_from_value;
use log::{debug, info};
use mnemo_rs_protocol::EmbeddingPort;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Document field holding the record text.
pub const CONTENT_FIELD: &str = "content";
/// Document field holding the record embedding.
pub const VECTOR_FIELD: &str = "content_vector";
/// Document field holding the record metadata.
pub const METADATA_FIELD: &str = "metadata";

/// Long-term memory: embeds facts on write and answers hybrid queries on read.
#[derive(Clone)]
pub struct LongTermStore {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn EmbeddingPort>,
    index: String,
    options: MemoryRecallOptions,
}

impl std::fmt::Debug for LongTermStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongTermStore")
            .field("index", &self.index)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LongTermStore {
    /// Create a store writing into `index`.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn EmbeddingPort>,
        index: impl Into<String>,
        options: MemoryRecallOptions,
    ) -> Self {
        Self {
            backend,
            embedder,
            index: index.into(),
            options,
        }
    }

    /// Index name used for every record.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Create the index when missing.
    pub async fn ensure_index(&self) -> Result<(), MemoryError> {
        self.backend
            .ensure_index(&self.index)
            .await
            .map_err(|err| MemoryError::IndexWriteFailed(err.to_string()))
    }

    /// Embed and persist one record, returning its generated id.
    ///
    /// The document is written in a single call only after the embedding
    /// succeeded, so a failed store never leaves a partial record behind.
    pub async fn store(&self, content: &str, metadata: Value) -> Result<String, MemoryError> {
        let embedding = self
            .embedder
            .embed(content)
            .await
            .map_err(|err| MemoryError::EmbeddingFailed(err.to_string()))?;
        let id = Uuid::new_v4().to_string();
        let document = IndexedDocument {
            id: id.clone(),
            source: json!({
                CONTENT_FIELD: content,
                VECTOR_FIELD: embedding,
                METADATA_FIELD: metadata,
            }),
        };
        self.backend
            .upsert(&self.index, document)
            .await
            .map_err(|err| MemoryError::IndexWriteFailed(err.to_string()))?;
        info!(
            "stored long-term record (index={}, id={}, content_len={})",
            self.index,
            id,
            content.len()
        );
        Ok(id)
    }

    /// Records most relevant to `query`, best first, at most `top_k`.
    ///
    /// A missing or empty index yields an empty result.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|err| MemoryError::EmbeddingFailed(err.to_string()))?;
        let (text_weight, vector_weight) = self.options.effective_weights();
        let query = HybridQuery {
            text: query.to_string(),
            vector,
            text_field: CONTENT_FIELD.to_string(),
            vector_field: VECTOR_FIELD.to_string(),
            top_k,
            text_weight,
            vector_weight,
            min_score: self.options.min_score,
        };
        let hits = self.backend.hybrid_query(&self.index, &query).await?;
        let records = hits
            .into_iter()
            .map(record_from_hit)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "retrieved long-term records (index={}, top_k={}, returned={})",
            self.index,
            top_k,
            records.len()
        );
        Ok(records)
    }

    /// Delete every record by dropping the index. Returns false when it did not exist.
    pub async fn drop_all(&self) -> Result<bool, MemoryError> {
        let dropped = self.backend.delete_index(&self.index).await?;
        if dropped {
            info!("dropped long-term index (index={})", self.index);
        } else {
            debug!("long-term index already absent (index={})", self.index);
        }
        Ok(dropped)
    }
}

fn record_from_hit(hit: SearchHit) -> Result<MemoryRecord, MemoryError> {
    let content = hit
        .source
        .get(CONTENT_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            MemoryError::MalformedRetrievalResult(format!("hit {} has no text content", hit.id))
        })?
        .to_string();
    let embedding = hit
        .source
        .get(VECTOR_FIELD)
        .and_then(vector_from_value)
        .ok_or_else(|| {
            MemoryError::MalformedRetrievalResult(format!("hit {} has no numeric vector", hit.id))
        })?;
    let metadata = hit.source.get(METADATA_FIELD).cloned().unwrap_or(Value::Null);
    Ok(MemoryRecord {
        id: hit.id,
        content,
        embedding,
        metadata,
        score: Some(hit.score),
    })
}
