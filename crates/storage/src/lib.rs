//! Content hashing, remote indexes and sync targets.
//!
//! Everything camsync knows about the place photos end up lives here: how a
//! file's content digest is computed, what the target already holds, and how
//! a file gets copied there.

pub mod digest;
pub mod error;
mod index;
mod path;
pub mod target;
mod walk;

pub use crate::digest::{Digest, HashType, Hasher, hash_bytes, hash_file};
pub use crate::index::RemoteIndex;
pub use crate::path::validate as validate_path;
pub use crate::target::{CopyOptions, SyncTarget};
pub use crate::walk::{PathStream, walk};
use std::sync::Arc;

pub type TargetHandle = Arc<dyn SyncTarget + Send + Sync>;
