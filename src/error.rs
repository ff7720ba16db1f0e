//! Binary Error Types
//!
//! Everything here ends the run with a non-zero exit status.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The mount hook reported something other than a mount.
    #[display("ignored event {_0}")]
    WrongEvent(#[error(not(source))] String),
    /// Configuration could not be loaded or is invalid.
    #[display("invalid configuration")]
    Config,
    /// A configured external program is missing or the target can't be set up.
    #[display("could not set up {_0}")]
    Setup(#[error(not(source))] &'static str),
    /// The run stopped before every file was processed.
    #[display("upload aborted")]
    Upload,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upload)
    }
}
