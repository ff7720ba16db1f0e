//! Destination path validation.
//!
//! Every destination handed to a [`SyncTarget`](crate::SyncTarget) is relative
//! to the target root. Validation makes sure a derived name can never climb
//! out of that root, whatever ends up inside a camera's model string.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a destination path relative to a target root.
///
/// `.` components and duplicate separators are dropped, `..` is resolved as
/// long as it never leaves the root. Absolute paths are re-rooted. Empty
/// results, null bytes and Windows prefixes are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use camsync_storage::validate_path;
///
/// assert_eq!(
///     validate_path("2023/./20230601_143000_RX100_IMG_0001.jpg").unwrap(),
///     Path::new("2023/20230601_143000_RX100_IMG_0001.jpg"),
/// );
/// assert!(validate_path("../20230601_143000_RX100_IMG_0001.jpg").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // C strings in syscalls and in child process arguments.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}
