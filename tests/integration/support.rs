//! Shared fixtures for the integration tests.

use memfs::key::CacheKey;
use memfs::store::{CacheStore, MemoryStore, StoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store wrapper counting every pool operation.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    multi_gets: AtomicUsize,
    sets: AtomicUsize,
}

impl CountingStore {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn multi_gets(&self) -> usize {
        self.multi_gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl CacheStore for CountingStore {
    fn get(&self, key: &CacheKey) -> StoreResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn get_multi(&self, keys: &[CacheKey]) -> StoreResult<HashMap<CacheKey, Vec<u8>>> {
        self.multi_gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_multi(keys)
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn flush_all(&self) -> StoreResult<()> {
        self.inner.flush_all()
    }
}
