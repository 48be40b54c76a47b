//! Cache-backed resource loader.
//!
//! # Overview
//!
//! A load call resolves a batch of identifiers against the cache pool:
//! 1. **Derive**: compute a [`CacheKey`] per identifier
//! 2. **Multi-get**: ask the pool for every key in one round trip
//! 3. **Reconcile**: fetch, normalize and store only the keys the pool did not
//!    return, then hand back everything in request order
//!
//! Nothing is refreshed on a hit. Misses are written eagerly, one key at a
//! time, so a later failure in the same batch does not undo earlier writes.
//!
//! Turning the returned text into behavior (executing it, rendering it,
//! piping it somewhere) is the caller's job. The loader stops at handing back
//! well-formed content.
//!
//! # Example
//!
//! ```no_run
//! use memfs::loader::Loader;
//! use memfs::store::MemoryStore;
//!
//! let loader = Loader::new(MemoryStore::new());
//! let outcome = loader.load(&["/srv/app/bootstrap.php", "/srv/app/routes.php"], true)?;
//! for resource in &outcome {
//!     println!("{} ({:?})", resource.identifier, resource.origin);
//! }
//! # Ok::<(), memfs::loader::LoadError>(())
//! ```

pub mod fetch;
pub mod outcome;

use std::collections::HashMap;

use crate::key::CacheKey;
use crate::source::{Markers, ResourceReader, SourceReader};
use crate::store::{CacheStore, StoreError};

pub use fetch::Fetcher;
pub use outcome::{LoadOutcome, LoadStats, Origin, Resource, SkippedResource};

/// Errors that can occur while loading resources.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// An empty identifier was passed in.
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    /// The resource could not be read, or was empty.
    #[error("Unable to load resource {identifier}: {reason}")]
    ResourceUnavailable {
        /// Identifier that failed
        identifier: String,
        /// What went wrong
        reason: String,
    },

    /// The resource lacks the opening marker.
    #[error("Resource must contain opening marker `{marker}`: {identifier}")]
    MalformedResource {
        /// Identifier that failed
        identifier: String,
        /// The marker that was expected
        marker: String,
    },

    /// The cache pool failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LoadError {
    /// Identifier the error is about, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::ResourceUnavailable { identifier, .. }
            | Self::MalformedResource { identifier, .. } => Some(identifier),
            Self::EmptyIdentifier | Self::Store(_) => None,
        }
    }
}

/// Loads resources through a cache pool.
///
/// All operations are synchronous and take `&self`; the loader keeps no
/// mutable state of its own. Concurrent callers sharing a pool get no mutual
/// exclusion: two simultaneous misses on one key both fetch and both write,
/// and the last write wins.
#[derive(Debug)]
pub struct Loader<S, R = SourceReader> {
    store: S,
    fetcher: Fetcher<R>,
}

impl<S: CacheStore> Loader<S> {
    /// Create a loader over `store` reading sources from disk and HTTP.
    pub fn new(store: S) -> Self {
        Self {
            store,
            fetcher: Fetcher::new(SourceReader::default(), Markers::default()),
        }
    }
}

impl<S: CacheStore, R: ResourceReader> Loader<S, R> {
    /// Replace the source reader.
    #[must_use]
    pub fn with_reader<R2: ResourceReader>(self, reader: R2) -> Loader<S, R2> {
        Loader {
            store: self.store,
            fetcher: Fetcher::new(reader, self.fetcher.into_markers()),
        }
    }

    /// Replace the content markers.
    #[must_use]
    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.fetcher.set_markers(markers);
        self
    }

    /// The backing cache pool.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Markers enforced on fetched content.
    pub fn markers(&self) -> &Markers {
        self.fetcher.markers()
    }

    /// Load a batch of identifiers.
    ///
    /// Issues exactly one multi-get for the batch, then one fetch and one
    /// write per key the pool did not return.
    ///
    /// With `required` set, the first failing fetch aborts the whole call.
    /// Without it, unavailable resources are left out and listed in
    /// [`LoadOutcome::skipped`]; malformed resources are left out too unless
    /// the batch holds a single key, in which case the error is returned.
    ///
    /// If two identifiers derive the same key, the later one names the entry.
    ///
    /// # Arguments
    ///
    /// * `identifiers` - File paths or `http(s)` URLs, in the order results
    ///   should come back
    /// * `required` - Treat any fetch failure as fatal for the whole call
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyIdentifier`] for an empty identifier, a fetch
    /// error as described above, or a store error.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use memfs::{Loader, MemoryStore};
    ///
    /// let loader = Loader::new(MemoryStore::new());
    /// let outcome = loader.load(&["lib/a.php", "lib/b.php"], false)?;
    /// for resource in outcome.iter() {
    ///     println!("{}: {} bytes", resource.identifier, resource.content.len());
    /// }
    /// # Ok::<(), memfs::LoadError>(())
    /// ```
    pub fn load<I: AsRef<str>>(
        &self,
        identifiers: &[I],
        required: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let mut order: Vec<CacheKey> = Vec::with_capacity(identifiers.len());
        let mut names: HashMap<CacheKey, &str> = HashMap::with_capacity(identifiers.len());

        for identifier in identifiers {
            let identifier = identifier.as_ref();
            if identifier.is_empty() {
                return Err(LoadError::EmptyIdentifier);
            }
            let key = CacheKey::derive(identifier);
            if names.insert(key.clone(), identifier).is_none() {
                order.push(key);
            }
        }

        if order.is_empty() {
            return Ok(LoadOutcome::default());
        }

        let mut stats = LoadStats {
            requested: order.len(),
            multi_gets: 1,
            ..Default::default()
        };

        let mut contents: HashMap<CacheKey, (String, Origin)> = self
            .store
            .get_multi(&order)?
            .into_iter()
            .filter(|(key, _)| names.contains_key(key))
            .map(|(key, value)| (key, (decode(value), Origin::Cache)))
            .collect();
        stats.cache_hits = contents.len();

        let mut skipped = Vec::new();

        if contents.len() < order.len() {
            let single = order.len() == 1;
            for key in &order {
                if contents.contains_key(key) {
                    log::trace!("Cache hit: {}", names[key]);
                    continue;
                }

                let identifier = names[key];
                log::trace!("Cache miss: {}", identifier);

                match self.fetcher.fetch(identifier) {
                    Ok(content) => {
                        self.store.set(key, content.as_bytes())?;
                        stats.fetched += 1;
                        contents.insert(key.clone(), (content, Origin::Source));
                    }
                    Err(err) if is_skippable(&err, required, single) => {
                        log::warn!("Skipping {}: {}", identifier, err);
                        skipped.push(SkippedResource {
                            identifier: identifier.to_string(),
                            reason: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        stats.skipped = skipped.len();

        let resources = order
            .iter()
            .filter_map(|key| {
                contents.remove(key).map(|(content, origin)| Resource {
                    identifier: names[key].to_string(),
                    key: key.clone(),
                    content,
                    origin,
                })
            })
            .collect();

        log::debug!(
            "Loaded {} resources: {} cached, {} fetched, {} skipped",
            stats.requested,
            stats.cache_hits,
            stats.fetched,
            stats.skipped
        );

        Ok(LoadOutcome {
            resources,
            skipped,
            stats,
        })
    }

    /// Load an identifier only if the pool does not already hold it.
    ///
    /// Returns `Ok(None)` without touching the source or writing anything when
    /// the key exists. The existence check and the load are separate pool
    /// operations, so a concurrent caller may load the same key in between.
    ///
    /// # Errors
    ///
    /// Same as [`Loader::load`] for a single identifier.
    pub fn once(
        &self,
        identifier: &str,
        required: bool,
    ) -> Result<Option<LoadOutcome>, LoadError> {
        if identifier.is_empty() {
            return Err(LoadError::EmptyIdentifier);
        }

        if self.store.exists(&CacheKey::derive(identifier))? {
            log::debug!("Already cached, not reloading: {}", identifier);
            return Ok(None);
        }

        self.load(&[identifier], required).map(Some)
    }

    /// Remove the cached entries for the given identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyIdentifier`] or a store error.
    pub fn flush<I: AsRef<str>>(&self, identifiers: &[I]) -> Result<(), LoadError> {
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            if identifier.is_empty() {
                return Err(LoadError::EmptyIdentifier);
            }
            self.store.delete(&CacheKey::derive(identifier))?;
            log::debug!("Flushed {}", identifier);
        }
        Ok(())
    }

    /// Remove every entry from the pool.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn flush_all(&self) -> Result<(), LoadError> {
        self.store.flush_all()?;
        log::info!("Flushed cache pool");
        Ok(())
    }
}

fn is_skippable(err: &LoadError, required: bool, single: bool) -> bool {
    if required {
        return false;
    }
    match err {
        LoadError::ResourceUnavailable { .. } => true,
        LoadError::MalformedResource { .. } => !single,
        LoadError::EmptyIdentifier | LoadError::Store(_) => false,
    }
}

fn decode(value: Vec<u8>) -> String {
    String::from_utf8(value)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
