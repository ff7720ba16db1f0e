//! Sync target trait and implementations.
//!
//! A sync target is the single remote a run uploads into. It answers two
//! questions: "what do you already have?" ([`SyncTarget::fetch_index`]) and
//! "please store this file under that name" ([`SyncTarget::copy`]).

mod local;
#[cfg(feature = "mock")]
mod mock;
mod rclone;
mod ro;

pub use self::local::LocalTarget;
#[cfg(feature = "mock")]
pub use self::mock::MockTarget;
pub use self::rclone::RcloneTarget;
pub use self::ro::ReadOnlyTarget;
use crate::digest::HashType;
use crate::error::Result;
use crate::index::RemoteIndex;
use async_trait::async_trait;
use std::path::Path;

/// Options for [`SyncTarget::copy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyOptions {
    /// Leave the destination untouched if something already exists at that
    /// path, regardless of its content.
    pub skip_if_exists: bool,
}
impl Default for CopyOptions {
    fn default() -> Self {
        Self { skip_if_exists: true }
    }
}

/// Unified interface for upload destinations.
///
/// # Paths
/// Destinations are relative to the target root and are validated with
/// [`validate_path`](crate::validate_path) by every implementation. Local
/// sources are plain filesystem paths.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use camsync_storage::{CopyOptions, SyncTarget, error::Result, hash_file};
///
/// async fn upload_once(target: &dyn SyncTarget, local: &Path, name: &Path) -> Result<bool> {
///     let index = target.fetch_index().await?;
///     if index.contains_digest(&hash_file(local, target.hash_type()).await?) {
///         return Ok(false);
///     }
///     target.copy(local, name, CopyOptions::default()).await?;
///     Ok(true)
/// }
/// ```
#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// Name of the configured target, used for logging.
    fn name(&self) -> &str;

    /// Algorithm used for the digests in [`fetch_index`](Self::fetch_index).
    fn hash_type(&self) -> HashType;

    /// Fetch a snapshot of every entry at the target together with its
    /// content digest.
    ///
    /// An error here means the target itself is unusable (misconfigured
    /// remote, missing directory, authentication), not that it's empty.
    async fn fetch_index(&self) -> Result<RemoteIndex>;

    /// Copy a local file to `destination`, relative to the target root.
    ///
    /// With [`CopyOptions::skip_if_exists`] the call is a successful no-op
    /// when the destination path is already taken.
    async fn copy(&self, local: &Path, destination: &Path, options: CopyOptions) -> Result<()>;
}
