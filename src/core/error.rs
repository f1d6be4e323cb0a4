//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Configuration-level variants (`Configuration`, `GlobPattern`, `NotADirectory`)
/// abort the requested operation. Everything else is scoped to a single file and
/// ends up as that file's `ShredOutcome::Failure`.
#[derive(Debug, Error)]
pub enum ShredError {
    /// The owner-matching pattern is not a valid regular expression.
    #[error("Invalid owner pattern: {0}")]
    Configuration(#[from] regex::Error),

    /// Represents an error during the parsing or building of a glob pattern.
    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] globset::Error),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The content read back after a pass did not match what the pass wrote.
    #[error("Verification failed for {path} on pass {pass}/{total}: {reason}")]
    VerificationFailed {
        path: PathBuf,
        pass: u32,
        total: u32,
        reason: String,
    },

    /// No text extractor is available for this file's format.
    #[error("No content extractor available for {0}")]
    UnsupportedContentFormat(PathBuf),
}

impl ShredError {
    /// Returns `true` for errors that abort a whole match or batch request.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ShredError::Configuration(_) | ShredError::GlobPattern(_) | ShredError::NotADirectory(_)
        )
    }
}

pub type Result<T, E = ShredError> = std::result::Result<T, E>;
