//! Metadata Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The metadata tool could not be found.
    #[display("executable not found: {_0}")]
    ToolNotFound(#[error(not(source))] String),
    /// The metadata tool could not be started.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The metadata tool ran but reported failure, usually because the file
    /// is unreadable or not a format it understands.
    #[display("{tool} exited with {}: {stderr}", status.map_or_else(|| "signal".to_string(), |s| format!("status {s}")))]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },
    /// Output from the metadata tool could not be understood.
    #[display("unexpected output from metadata reader: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// A tag without which the file can't be named is absent.
    #[display("missing required tag {_0}")]
    MissingTag(#[error(not(source))] String),
    /// A timestamp tag is present but isn't a date.
    #[display("tag {tag} is not a valid timestamp: {value:?}")]
    InvalidTimestamp { tag: String, value: String },
    /// Every timestamp candidate was missing or unparsable.
    #[display("no usable timestamp, tried {}", _0.join(", "))]
    NoTimestamp(#[error(not(source))] Vec<String>),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
