//! Cache key derivation.
//!
//! Every identifier (local path or remote URI) maps to a fixed-length key
//! computed from the identifier string alone. The content behind the
//! identifier plays no part, so a key can be derived before anything is read.
//!
//! # Example
//!
//! ```
//! use memfs::key::CacheKey;
//!
//! let key = CacheKey::derive("/var/www/index.php");
//! assert_eq!(key.as_str().len(), 64);
//! assert_eq!(key, CacheKey::derive("/var/www/index.php"));
//! ```

use serde::Serialize;
use std::fmt;

/// Length of a rendered cache key in characters.
pub const KEY_LEN: usize = 64;

/// Deterministic cache key for an identifier.
///
/// Rendered as lowercase hex of the BLAKE3 digest of the identifier bytes.
/// Not reversible to the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an identifier.
    #[must_use]
    pub fn derive(identifier: &str) -> Self {
        Self(blake3::hash(identifier.as_bytes()).to_hex().to_string())
    }

    /// Wrap an already-rendered key, e.g. one read back from a backing store.
    ///
    /// Returns `None` unless the value is exactly [`KEY_LEN`] lowercase hex digits.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        let valid = value.len() == KEY_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(value.to_string()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as the byte string handed to the store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
