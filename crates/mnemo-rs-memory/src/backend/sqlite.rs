//! SQLite-backed key-value and search backends.

use super::{
    HybridQuery, IndexedDocument, KeyValueBackend, SearchBackend, SearchHit, resolve_range,
};
use crate::error::MemoryError;
use crate::scoring::rank_documents;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;

fn store_err(err: rusqlite::Error) -> MemoryError {
    MemoryError::StoreUnavailable(err.to_string())
}

fn open_connection(path: &Path) -> Result<Connection, MemoryError> {
    let conn = Connection::open(path).map_err(store_err)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(store_err)?;
    Ok(conn)
}

const KV_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv_lists (
    key TEXT NOT NULL,
    seq INTEGER NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (key, seq)
);
CREATE TABLE IF NOT EXISTS kv_values (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL
);
";

/// Key-value backend persisted in a SQLite database.
pub struct SqliteKeyValue {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteKeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKeyValue").finish_non_exhaustive()
    }
}

impl SqliteKeyValue {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        let conn = open_connection(path)?;
        info!("opened sqlite key-value store (path={})", path.display());
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, MemoryError> {
        Self::with_connection(Connection::open_in_memory().map_err(store_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, MemoryError> {
        conn.execute_batch(KV_SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn list_len(conn: &Connection, key: &str) -> Result<usize, MemoryError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM kv_lists WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .map_err(store_err)?;
    Ok(count as usize)
}

fn value_exists(conn: &Connection, key: &str) -> Result<bool, MemoryError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM kv_values WHERE key = ?1",
            params![key],
            |_| Ok(()),
        )
        .optional()
        .map_err(store_err)?;
    Ok(found.is_some())
}

fn wrong_type(key: &str) -> MemoryError {
    MemoryError::StoreUnavailable(format!("wrong value type at key {key}"))
}

#[async_trait]
impl KeyValueBackend for SqliteKeyValue {
    async fn ping(&self) -> Result<(), MemoryError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(())).map_err(store_err)
    }

    async fn push(&self, key: &str, value: Vec<u8>) -> Result<usize, MemoryError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(store_err)?;
        if value_exists(&tx, key)? {
            return Err(wrong_type(key));
        }
        tx.execute(
            "INSERT INTO kv_lists (key, seq, value)
             VALUES (?1, (SELECT COALESCE(MAX(seq), -1) + 1 FROM kv_lists WHERE key = ?1), ?2)",
            params![key, value],
        )
        .map_err(store_err)?;
        let len = list_len(&tx, key)?;
        tx.commit().map_err(store_err)?;
        Ok(len)
    }

    async fn range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>, MemoryError> {
        let conn = self.conn.lock();
        if value_exists(&conn, key)? {
            return Err(wrong_type(key));
        }
        let len = list_len(&conn, key)?;
        let Some((start, stop)) = resolve_range(len, start, stop) else {
            return Ok(Vec::new());
        };
        let mut stmt = conn
            .prepare("SELECT value FROM kv_lists WHERE key = ?1 ORDER BY seq LIMIT ?2 OFFSET ?3")
            .map_err(store_err)?;
        let rows = stmt
            .query_map(
                params![key, (stop - start + 1) as i64, start as i64],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .map_err(store_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(store_err)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MemoryError> {
        let conn = self.conn.lock();
        if list_len(&conn, key)? > 0 {
            return Err(wrong_type(key));
        }
        conn.query_row(
            "SELECT value FROM kv_values WHERE key = ?1",
            params![key],
            |row| row.get::<_, Vec<u8>>(0),
        )
        .optional()
        .map_err(store_err)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), MemoryError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(store_err)?;
        tx.execute("DELETE FROM kv_lists WHERE key = ?1", params![key])
            .map_err(store_err)?;
        tx.execute(
            "INSERT INTO kv_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(store_err)?;
        tx.commit().map_err(store_err)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, MemoryError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(store_err)?;
        let mut removed = 0;
        for key in keys {
            let lists = tx
                .execute("DELETE FROM kv_lists WHERE key = ?1", params![key])
                .map_err(store_err)?;
            let values = tx
                .execute("DELETE FROM kv_values WHERE key = ?1", params![key])
                .map_err(store_err)?;
            if lists > 0 || values > 0 {
                removed += 1;
            }
        }
        tx.commit().map_err(store_err)?;
        debug!("deleted keys (requested={}, removed={})", keys.len(), removed);
        Ok(removed)
    }
}

const SEARCH_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS search_indices (
    name TEXT PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS search_documents (
    index_name TEXT NOT NULL,
    id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    source TEXT NOT NULL,
    PRIMARY KEY (index_name, id)
);
";

/// Search index persisted in a SQLite database, scored in process.
pub struct SqliteSearchIndex {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteSearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSearchIndex").finish_non_exhaustive()
    }
}

impl SqliteSearchIndex {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        let conn = open_connection(path)?;
        info!("opened sqlite search index (path={})", path.display());
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, MemoryError> {
        Self::with_connection(Connection::open_in_memory().map_err(store_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, MemoryError> {
        conn.execute_batch(SEARCH_SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn index_exists(conn: &Connection, index: &str) -> Result<bool, MemoryError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM search_indices WHERE name = ?1",
            params![index],
            |_| Ok(()),
        )
        .optional()
        .map_err(store_err)?;
    Ok(found.is_some())
}

#[async_trait]
impl SearchBackend for SqliteSearchIndex {
    async fn ensure_index(&self, index: &str) -> Result<(), MemoryError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO search_indices (name) VALUES (?1)",
            params![index],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, MemoryError> {
        let conn = self.conn.lock();
        index_exists(&conn, index)
    }

    async fn delete_index(&self, index: &str) -> Result<bool, MemoryError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(store_err)?;
        tx.execute(
            "DELETE FROM search_documents WHERE index_name = ?1",
            params![index],
        )
        .map_err(store_err)?;
        let removed = tx
            .execute("DELETE FROM search_indices WHERE name = ?1", params![index])
            .map_err(store_err)?;
        tx.commit().map_err(store_err)?;
        Ok(removed > 0)
    }

    async fn upsert(&self, index: &str, document: IndexedDocument) -> Result<(), MemoryError> {
        let source = serde_json::to_string(&document.source)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(store_err)?;
        tx.execute(
            "INSERT OR IGNORE INTO search_indices (name) VALUES (?1)",
            params![index],
        )
        .map_err(store_err)?;
        tx.execute(
            "INSERT INTO search_documents (index_name, id, seq, source)
             VALUES (?1, ?2,
                (SELECT COALESCE(MAX(seq), -1) + 1 FROM search_documents WHERE index_name = ?1),
                ?3)
             ON CONFLICT(index_name, id) DO UPDATE SET source = excluded.source",
            params![index, document.id, source],
        )
        .map_err(store_err)?;
        tx.commit().map_err(store_err)
    }

    async fn hybrid_query(
        &self,
        index: &str,
        query: &HybridQuery,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        let documents = {
            let conn = self.conn.lock();
            if !index_exists(&conn, index)? {
                debug!("hybrid query on missing index (index={index})");
                return Ok(Vec::new());
            }
            let mut stmt = conn
                .prepare(
                    "SELECT id, source FROM search_documents WHERE index_name = ?1 ORDER BY seq",
                )
                .map_err(store_err)?;
            let rows = stmt
                .query_map(params![index], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(store_err)?
        };

        let parsed = documents
            .into_iter()
            .map(|(id, source)| {
                let value = serde_json::from_str::<Value>(&source).map_err(|err| {
                    warn!("unreadable document (index={index}, id={id}, err={err})");
                    MemoryError::MalformedRetrievalResult(format!("document {id}: {err}"))
                })?;
                Ok((id, value))
            })
            .collect::<Result<Vec<_>, MemoryError>>()?;
        Ok(rank_documents(
            query,
            parsed.iter().map(|(id, source)| (id.as_str(), source)),
        ))
    }
}
