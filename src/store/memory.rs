//! In-process cache pool.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CacheStore, StoreError, StoreResult};
use crate::key::CacheKey;

/// Cache pool held in process memory.
///
/// Useful for tests and for one-shot runs where nothing needs to survive the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked while holding the lock.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether the pool holds no entries.
    ///
    /// # Errors
    ///
    /// Same as [`MemoryStore::len`].
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<CacheKey, Vec<u8>>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>> {
        let entries = self.lock()?;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()> {
        self.lock()?.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &CacheKey) -> StoreResult<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    fn flush_all(&self) -> StoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}
