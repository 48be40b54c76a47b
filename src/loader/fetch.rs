//! Source reads and content normalization for cache misses.

use crate::loader::LoadError;
use crate::source::{Address, Markers, ResourceReader};

/// Reads an identifier from its source and normalizes the content.
#[derive(Debug)]
pub struct Fetcher<R> {
    reader: R,
    markers: Markers,
}

impl<R: ResourceReader> Fetcher<R> {
    /// Create a fetcher over `reader` enforcing `markers`.
    pub fn new(reader: R, markers: Markers) -> Self {
        Self { reader, markers }
    }

    /// Markers enforced on fetched content.
    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub(crate) fn set_markers(&mut self, markers: Markers) {
        self.markers = markers;
    }

    pub(crate) fn into_markers(self) -> Markers {
        self.markers
    }

    /// Fetch and normalize the content behind `identifier`.
    ///
    /// # Errors
    ///
    /// * [`LoadError::ResourceUnavailable`] when the read fails or yields
    ///   nothing. The caller decides whether that is fatal.
    /// * [`LoadError::MalformedResource`] when the content lacks the opening
    ///   marker.
    pub fn fetch(&self, identifier: &str) -> Result<String, LoadError> {
        let address = Address::resolve(identifier);
        log::trace!("Reading {} from {}", identifier, address);

        let bytes =
            self.reader
                .read_all(&address)
                .map_err(|err| LoadError::ResourceUnavailable {
                    identifier: identifier.to_string(),
                    reason: err.to_string(),
                })?;

        if bytes.is_empty() {
            return Err(LoadError::ResourceUnavailable {
                identifier: identifier.to_string(),
                reason: "resource is empty".to_string(),
            });
        }

        let content = String::from_utf8(bytes)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned());

        if !self.markers.has_opening(&content) {
            return Err(LoadError::MalformedResource {
                identifier: identifier.to_string(),
                marker: self.markers.open().to_string(),
            });
        }

        Ok(self.markers.normalize(content))
    }
}
