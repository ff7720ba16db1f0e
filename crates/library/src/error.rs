//! Library Error Types
//!
//! Only failures that stop a whole run are errors. Anything that goes wrong
//! with a single file becomes a [`FileOutcome`](crate::FileOutcome) instead.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The mounted device has no `DCIM` directory, so it isn't a camera card.
    #[display("no DCIM folder in {}", _0.display())]
    NoDcim(#[error(not(source))] PathBuf),
    /// The sync target's index could not be fetched.
    #[display("could not fetch the index of sync target {_0}")]
    Index(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}
