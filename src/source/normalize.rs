//! Marker validation and trailing-marker normalization.
//!
//! Resource content is delimited by an opening and a closing marker (`<?` and
//! `?>` by default). Content must contain the opening marker somewhere, and
//! after normalization it always ends on a clean closing marker.
//!
//! # Example
//!
//! ```
//! use memfs::source::Markers;
//!
//! let markers = Markers::default();
//! assert_eq!(markers.normalize("<?php echo 1;".to_string()), "<?php echo 1;\n?>\n");
//! assert_eq!(markers.normalize("<?php ?>".to_string()), "<?php ?>");
//! ```

use serde::{Deserialize, Serialize};

/// Default opening marker.
pub const DEFAULT_OPEN_MARKER: &str = "<?";

/// Default closing marker.
pub const DEFAULT_CLOSE_MARKER: &str = "?>";

/// Characters ignored when checking what trails the last closing marker.
const TRAILING_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Opening and closing marker tokens that bound valid content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    open: String,
    close: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_MARKER.to_string(),
            close: DEFAULT_CLOSE_MARKER.to_string(),
        }
    }
}

impl Markers {
    /// Create a marker pair. Returns `None` if either marker is empty.
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Option<Self> {
        let (open, close) = (open.into(), close.into());
        if open.is_empty() || close.is_empty() {
            return None;
        }
        Some(Self { open, close })
    }

    /// The opening marker.
    #[must_use]
    pub fn open(&self) -> &str {
        &self.open
    }

    /// The closing marker.
    #[must_use]
    pub fn close(&self) -> &str {
        &self.close
    }

    /// Whether `content` contains the opening marker.
    #[must_use]
    pub fn has_opening(&self, content: &str) -> bool {
        content.contains(self.open.as_str())
    }

    /// Whether `content` already ends on a clean closing marker.
    ///
    /// True when the last closing marker is followed by whitespace only.
    #[must_use]
    pub fn ends_cleanly(&self, content: &str) -> bool {
        content.rfind(self.close.as_str()).is_some_and(|pos| {
            content[pos + self.close.len()..]
                .trim_matches(TRAILING_WHITESPACE)
                .is_empty()
        })
    }

    /// Append the canonical `"\n<close>\n"` sequence unless the content
    /// already ends cleanly. Idempotent.
    #[must_use]
    pub fn normalize(&self, mut content: String) -> String {
        if !self.ends_cleanly(&content) {
            content.push('\n');
            content.push_str(&self.close);
            content.push('\n');
        }
        content
    }
}
