//! Cache pool backends.
//!
//! The loader treats its backing store as a black box holding byte-string
//! values under [`CacheKey`]s. Connection handling, eviction and expiry are
//! the backend's business.
//!
//! # Architecture
//!
//! * [`CacheStore`]: the capability set the loader consumes.
//! * [`memory`]: an in-process pool, lost when the process exits.
//! * [`sqlite`]: a persistent pool shared by every process that opens the
//!   same database file, namespaced by pool name.

pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::key::CacheKey;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors raised by a cache backend.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A SQLite operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store location could not be prepared.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A thread panicked while holding the store lock.
    #[error("Cache store lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value capability set consumed by the loader.
///
/// Implementations must be safe to share between threads; they provide no
/// cross-operation atomicity beyond what each individual call guarantees.
pub trait CacheStore: Send + Sync {
    /// Fetch a single value.
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>>;

    /// Fetch many values in one round trip.
    ///
    /// The returned map holds only the keys that were present.
    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &CacheKey) -> StoreResult<()>;

    /// Check whether a key is present.
    fn exists(&self, key: &CacheKey) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove every value in the pool.
    fn flush_all(&self) -> StoreResult<()>;
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>> {
        (**self).get_multi(keys)
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &CacheKey) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn flush_all(&self) -> StoreResult<()> {
        (**self).flush_all()
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>> {
        (**self).get_multi(keys)
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &CacheKey) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn flush_all(&self) -> StoreResult<()> {
        (**self).flush_all()
    }
}
