//! Short-term and long-term conversational memory stores for Mnemo.
//!
//! The stores in this crate are pure data: they read and write their backing
//! services and never call a generation model. Deciding when to summarize or
//! when to persist a fact belongs to the orchestrator in `mnemo-rs-core`.

pub mod backend;
pub mod error;
pub mod long_term;
pub mod model;
pub mod recall;
pub mod scoring;
pub mod short_term;

/// Backing-store contracts and bundled implementations.
pub use backend::{
    HybridQuery, InMemoryKeyValue, InMemorySearchIndex, IndexedDocument, KeyValueBackend,
    SearchBackend, SearchHit, SqliteKeyValue, SqliteSearchIndex,
};
/// Memory error type.
pub use error::MemoryError;
/// Long-term fact store.
pub use long_term::LongTermStore;
/// Data model shared by both stores.
pub use model::{AgedHistory, MemoryRecord, Message, Role, SessionContext, Summary};
/// Hybrid recall weighting.
pub use recall::{MemoryRecallMode, MemoryRecallOptions};
/// Short-term session store.
pub use short_term::ShortTermStore;
