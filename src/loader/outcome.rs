//! Results of a load call.

use std::collections::HashMap;

use serde::Serialize;

use crate::key::CacheKey;

/// Where a loaded resource's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Served from the cache pool.
    Cache,
    /// Read from its source and written to the pool by this call.
    Source,
}

/// A normalized resource ready to be handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Identifier as requested.
    pub identifier: String,
    /// Key the content is stored under.
    pub key: CacheKey,
    /// Normalized content.
    pub content: String,
    /// Cache hit or fresh fetch.
    pub origin: Origin,
}

/// An identifier left out of a best-effort load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedResource {
    /// Identifier as requested.
    pub identifier: String,
    /// Why it was left out.
    pub reason: String,
}

/// Counters for a single load call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Distinct keys in the request.
    pub requested: usize,
    /// Multi-get round trips issued to the pool.
    pub multi_gets: usize,
    /// Keys answered by the pool.
    pub cache_hits: usize,
    /// Keys read from source and written to the pool.
    pub fetched: usize,
    /// Keys left out of the result.
    pub skipped: usize,
}

/// Everything a load call produced.
///
/// Resources are ordered by the first position of their key in the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadOutcome {
    /// Loaded resources in request order.
    pub resources: Vec<Resource>,
    /// Identifiers omitted from a best-effort load.
    pub skipped: Vec<SkippedResource>,
    /// Call counters.
    pub stats: LoadStats,
}

impl LoadOutcome {
    /// Look up a resource by key.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.key == key)
    }

    /// Look up a resource by the identifier it was requested under.
    #[must_use]
    pub fn by_identifier(&self, identifier: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.identifier == identifier)
    }

    /// Key to content mapping for every loaded resource.
    #[must_use]
    pub fn contents(&self) -> HashMap<CacheKey, String> {
        self.resources
            .iter()
            .map(|r| (r.key.clone(), r.content.clone()))
            .collect()
    }

    /// Iterate over loaded resources in request order.
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    /// Number of loaded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether some identifiers were left out.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl<'a> IntoIterator for &'a LoadOutcome {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}
