//! Raw content retrieval from local paths and remote URIs.
//!
//! This module provides functionality for:
//! - Resolving an identifier into a retrieval [`Address`]
//! - Reading raw bytes from that address through a [`ResourceReader`]
//! - Validating and normalizing content markers (see [`normalize`])
//!
//! The address is only used for retrieval. Cache keys are always derived from
//! the identifier exactly as the caller gave it.

pub mod normalize;

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

pub use normalize::{Markers, DEFAULT_CLOSE_MARKER, DEFAULT_OPEN_MARKER};

/// Identifiers starting with this prefix are treated as remote URIs.
pub const REMOTE_PREFIX: &str = "http";

/// Default timeout for a whole remote request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on a remote response body, in bytes (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// URL schemes fetched over the network.
const REMOTE_SCHEMES: &[&str] = &["http", "https"];

/// Where raw content for an identifier is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A path on the local filesystem.
    Local(PathBuf),
    /// A remote URI, percent-encoded.
    Remote(Url),
}

impl Address {
    /// Resolve an identifier into a retrieval address.
    ///
    /// Identifiers beginning with [`REMOTE_PREFIX`] are parsed as URLs, which
    /// percent-encodes any character not allowed in its component. Anything
    /// that does not parse as an absolute `http` or `https` URL falls back to a
    /// local path, so `httpdocs:index.php` is read from disk.
    #[must_use]
    pub fn resolve(identifier: &str) -> Self {
        if identifier.starts_with(REMOTE_PREFIX) {
            match Url::parse(identifier) {
                Ok(url) if REMOTE_SCHEMES.contains(&url.scheme()) => return Self::Remote(url),
                Ok(url) => log::trace!(
                    "Scheme '{}' is not fetched remotely, reading as a path: {}",
                    url.scheme(),
                    identifier
                ),
                Err(e) => log::trace!("Not a URL, reading as a path: {} ({})", identifier, e),
            }
        }
        Self::Local(PathBuf::from(identifier))
    }

    /// Whether this address points at a remote resource.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Errors that can occur while reading raw content.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A remote request failed.
    #[error("Request to {url} failed: {reason}")]
    Http {
        /// Requested URL
        url: String,
        /// Failure description
        reason: String,
    },
}

/// Reads the raw bytes behind an address.
///
/// Implement this to plug in a different transport, or to count and stub
/// reads in tests.
pub trait ResourceReader: Send + Sync {
    /// Read everything at `address`.
    fn read_all(&self, address: &Address) -> Result<Vec<u8>, SourceError>;
}

/// Default reader: local filesystem plus blocking HTTP.
///
/// Remote requests are bounded twice: the whole request must finish within
/// the timeout, and the response body may not exceed the body limit
/// ([`DEFAULT_MAX_BODY_BYTES`] unless changed with
/// [`SourceReader::with_body_limit`]). A larger body fails the read with a
/// "body too large" reason. HTTP error statuses fail the read as well.
pub struct SourceReader {
    agent: ureq::Agent,
    body_limit: u64,
}

impl fmt::Debug for SourceReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceReader")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl SourceReader {
    /// Create a reader whose remote requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            body_limit: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Cap remote response bodies at `bytes`.
    #[must_use]
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Largest remote body this reader accepts, in bytes.
    #[must_use]
    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }

    fn read_local(path: &Path) -> Result<Vec<u8>, SourceError> {
        std::fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => SourceError::PermissionDenied(path.to_path_buf()),
            _ => SourceError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    fn read_remote(&self, url: &Url) -> Result<Vec<u8>, SourceError> {
        let http_err = |err: ureq::Error| SourceError::Http {
            url: url.to_string(),
            reason: err.to_string(),
        };

        let mut response = self.agent.get(url.as_str()).call().map_err(http_err)?;
        response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(http_err)
    }
}

impl ResourceReader for SourceReader {
    fn read_all(&self, address: &Address) -> Result<Vec<u8>, SourceError> {
        match address {
            Address::Local(path) => Self::read_local(path),
            Address::Remote(url) => {
                log::debug!("Fetching remote resource: {}", url);
                self.read_remote(url)
            }
        }
    }
}
