//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File (or target root) does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// An external program the target relies on could not be found.
    #[display("executable not found: {_0}")]
    ToolNotFound(#[error(not(source))] String),
    /// An external program ran but reported failure.
    #[display("{tool} exited with {}: {stderr}", status.map_or_else(|| "signal".to_string(), |s| format!("status {s}")))]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },
    /// Output from the target could not be understood.
    #[display("unexpected response from target: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The configured hash algorithm is unknown or unavailable for a target.
    #[display("unsupported hash type: {_0}")]
    UnsupportedHash(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ToolFailed { .. })
    }

    /// Map an I/O error on `path` to the most specific error kind.
    pub(crate) fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}
