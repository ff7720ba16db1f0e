//! Local filesystem sync target.
//!
//! Uploads into a directory, typically a NAS share mounted on the machine
//! the card gets plugged into. Digests are computed by hashing every file
//! under the root, which is fine for a photo archive on a local disk but
//! slow over a network mount; prefer rclone for those.

use crate::digest::{HashType, hash_file};
use crate::error::{ErrorKind, Result};
use crate::index::RemoteIndex;
use crate::target::{CopyOptions, SyncTarget};
use crate::validate_path;
use crate::walk::walk;
use async_trait::async_trait;
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Suffix for in-flight copies, renamed into place once complete.
const PARTIAL_SUFFIX: &str = ".camsync-partial";

/// Local filesystem sync target.
///
/// All destinations are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use camsync_storage::{HashType, target::LocalTarget};
///
/// # fn example() -> camsync_storage::error::Result<()> {
/// let target = LocalTarget::new("nas", "/mnt/nas/photos", HashType::Blake3)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalTarget {
    name: String,
    /// Root directory uploads are placed in
    root: PathBuf,
    hash_type: HashType,
}

impl LocalTarget {
    /// Create a new local filesystem target.
    ///
    /// # Errors
    ///
    /// The root must be absolute and must already exist as a directory: a
    /// missing root usually means a network share isn't mounted, and
    /// creating it would quietly fill the local disk instead.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>, hash_type: HashType) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Non-async: runs once at startup.
        let metadata = std::fs::metadata(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root, hash_type })
    }

    fn absolute_path(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    fn is_partial(path: &Path) -> bool {
        path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(PARTIAL_SUFFIX))
    }
}

#[async_trait]
impl SyncTarget for LocalTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    #[instrument(skip(self), fields(target = %self.name, root = %self.root.display()))]
    async fn fetch_index(&self) -> Result<RemoteIndex> {
        // The root was checked in the constructor, but a share can go away.
        if !fs::try_exists(&self.root).await.map_err(|e| ErrorKind::from_io(e, &self.root))? {
            exn::bail!(ErrorKind::NotFound(self.root.clone()));
        }
        let mut index = RemoteIndex::new(self.hash_type);
        let mut files = walk(&self.root);
        while let Some(path) = files.try_next().await? {
            if Self::is_partial(&path) {
                continue;
            }
            let relative = match path.strip_prefix(&self.root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            index.insert(relative, hash_file(&path, self.hash_type).await?);
        }
        tracing::debug!(entries = index.len(), "Indexed local target");
        Ok(index)
    }

    #[instrument(skip(self, options), fields(target = %self.name, local = %local.display(), destination = %destination.display()))]
    async fn copy(&self, local: &Path, destination: &Path, options: CopyOptions) -> Result<()> {
        let absolute = self.absolute_path(destination)?;
        if options.skip_if_exists && fs::try_exists(&absolute).await.map_err(|e| ErrorKind::from_io(e, destination))? {
            tracing::debug!("Destination already exists; leaving it untouched");
            return Ok(());
        }
        // Create parent directories if needed, to keep behaviour consistent
        // with object stores where "directories" are only key prefixes.
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, destination))?;
        }
        let mut partial = absolute.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        if let Err(e) = fs::copy(local, &partial).await {
            _ = fs::remove_file(&partial).await;
            exn::bail!(ErrorKind::from_io(e, local));
        }
        fs::rename(&partial, &absolute).await.map_err(|e| ErrorKind::from_io(e, destination))?;
        Ok(())
    }
}
