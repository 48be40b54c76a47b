//! Structured error handling and exit codes.

use serde::Serialize;

use crate::loader::LoadError;

/// Exit codes for the MemFS binary.
///
/// - 0: Success (every requested resource loaded)
/// - 1: General error (configuration, store or unexpected failure)
/// - 2: A required resource could not be read
/// - 3: A resource lacked the opening marker
/// - 4: Partial success (best-effort load skipped some identifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: all requested resources were loaded.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// A required resource was unavailable.
    ResourceUnavailable = 2,
    /// A resource was malformed.
    MalformedResource = 3,
    /// Partial success: some identifiers were skipped.
    PartialSuccess = 4,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "MF000",
            Self::GeneralError => "MF001",
            Self::ResourceUnavailable => "MF002",
            Self::MalformedResource => "MF003",
            Self::PartialSuccess => "MF004",
        }
    }

    /// Pick the exit code for an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::ResourceUnavailable { .. }) => Self::ResourceUnavailable,
            Some(LoadError::MalformedResource { .. }) => Self::MalformedResource,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MF002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Identifier the error concerns, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            identifier: err
                .downcast_ref::<LoadError>()
                .and_then(LoadError::identifier)
                .map(str::to_string),
        }
    }
}
