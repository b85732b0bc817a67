//! Centralized error types for mailsift.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop processing of a file or of the whole run.
#[derive(Error, Debug)]
pub enum SiftError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configured data directory does not exist.
    #[error("Data directory not found: {0}")]
    DataDirNotFound(PathBuf),

    /// The cached table is corrupt or was written by an incompatible version.
    #[error("Corrupt or incompatible cache '{path}': {reason}")]
    InvalidCache { path: PathBuf, reason: String },

    /// The configuration could not be applied.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `Result<T, SiftError>`.
pub type Result<T> = std::result::Result<T, SiftError>;

impl SiftError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A problem with a single logical line.
///
/// Row errors never escape the row that produced them: the pipeline logs
/// them, counts them, and moves on. Only [`RowError::MalformedSize`] keeps
/// the row (with a size of zero).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowError {
    #[error("timestamp does not match the configured date format")]
    MalformedTimestamp,

    #[error("size field is not a recognizable byte count")]
    MalformedSize,

    #[error("sender address could not be resolved")]
    UnresolvedSender,

    #[error("no recipient address could be resolved")]
    NoValidRecipients,
}

impl RowError {
    /// Whether this error causes the row to be dropped.
    pub fn drops_row(self) -> bool {
        !matches!(self, Self::MalformedSize)
    }

    /// Stable snake_case label used in summaries and JSON output.
    pub fn label(self) -> &'static str {
        match self {
            Self::MalformedTimestamp => "malformed_timestamp",
            Self::MalformedSize => "malformed_size",
            Self::UnresolvedSender => "unresolved_sender",
            Self::NoValidRecipients => "no_valid_recipients",
        }
    }
}
