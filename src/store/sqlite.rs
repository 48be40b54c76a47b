//! SQLite-backed cache pool.
//!
//! Entries live in a single `entries` table keyed by `(pool, key)`, so many
//! named pools can share one database file. Every process that opens the same
//! file sees the same pool, which is what lets cached content survive across
//! invocations.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{CacheStore, StoreError, StoreResult};
use crate::key::CacheKey;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entries (
    pool      TEXT    NOT NULL,
    key       TEXT    NOT NULL,
    value     BLOB    NOT NULL,
    stored_at INTEGER NOT NULL,
    PRIMARY KEY (pool, key)
);
";

/// Upper bound on keys bound into a single `IN (...)` query.
const MULTI_GET_CHUNK: usize = 500;

/// How long a writer waits on a database locked by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent cache pool stored in SQLite.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    pool: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create the database at `path` and use the named pool.
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path, pool: impl Into<String>) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        log::debug!("Opened cache database: {}", path.display());
        Self::with_connection(conn, pool.into())
    }

    /// Create a throwaway database held in memory.
    pub fn in_memory(pool: impl Into<String>) -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, pool.into())
    }

    fn with_connection(conn: Connection, pool: String) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            pool,
        })
    }

    /// Name of the pool this handle reads and writes.
    #[must_use]
    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Number of entries in this pool.
    pub fn len(&self) -> StoreResult<usize> {
        let count: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM entries WHERE pool = ?1",
            params![self.pool],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether this pool holds no entries.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>> {
        let value = self
            .lock()?
            .query_row(
                "SELECT value FROM entries WHERE pool = ?1 AND key = ?2",
                params![self.pool, key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>> {
        let conn = self.lock()?;
        let mut found = HashMap::with_capacity(keys.len());

        for chunk in keys.chunks(MULTI_GET_CHUNK) {
            let placeholders = (0..chunk.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT key, value FROM entries WHERE pool = ?1 AND key IN ({placeholders})"
            );

            let mut stmt = conn.prepare_cached(&sql)?;
            let bound = std::iter::once(self.pool.as_str()).chain(chunk.iter().map(CacheKey::as_str));
            let rows = stmt.query_map(params_from_iter(bound), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;

            for row in rows {
                let (key, value) = row?;
                match CacheKey::from_hex(&key) {
                    Some(key) => {
                        found.insert(key, value);
                    }
                    None => log::warn!("Ignoring malformed key in pool {}: {}", self.pool, key),
                }
            }
        }

        Ok(found)
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()> {
        self.lock()?.execute(
            "INSERT INTO entries (pool, key, value, stored_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now'))
             ON CONFLICT (pool, key) DO UPDATE
             SET value = excluded.value, stored_at = excluded.stored_at",
            params![self.pool, key.as_str(), value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.lock()?.execute(
            "DELETE FROM entries WHERE pool = ?1 AND key = ?2",
            params![self.pool, key.as_str()],
        )?;
        Ok(())
    }

    fn exists(&self, key: &CacheKey) -> StoreResult<bool> {
        let found = self
            .lock()?
            .query_row(
                "SELECT 1 FROM entries WHERE pool = ?1 AND key = ?2",
                params![self.pool, key.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn flush_all(&self) -> StoreResult<()> {
        let removed = self
            .lock()?
            .execute("DELETE FROM entries WHERE pool = ?1", params![self.pool])?;
        log::debug!("Flushed {} entries from pool {}", removed, self.pool);
        Ok(())
    }
}
