//! In-memory sync target for testing.

use crate::digest::{Digest, HashType};
use crate::error::{ErrorKind, Result};
use crate::index::RemoteIndex;
use crate::path::validate as validate_path;
use crate::target::{CopyOptions, SyncTarget};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory sync target for testing.
///
/// Serves a preset index and records every copy, so tests can assert on
/// exactly which files reached the target and under which names. Entries
/// recorded by [`copy`](SyncTarget::copy) are *not* added to the index,
/// matching a real run where the index is a snapshot.
///
/// # Examples
///
/// ```
/// use camsync_storage::{CopyOptions, HashType, SyncTarget, target::MockTarget};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let target = MockTarget::new(HashType::Md5);
/// target.copy(Path::new("/card/DCIM/IMG_0001.JPG"), Path::new("photo.jpg"), CopyOptions::default()).await?;
/// assert_eq!(target.copies().await.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockTarget {
    name: String,
    index: RemoteIndex,
    fail_index: bool,
    failing: HashSet<PathBuf>,
    copies: RwLock<Vec<(PathBuf, PathBuf)>>,
    index_fetches: AtomicUsize,
}

impl MockTarget {
    /// Empty target whose index uses `hash_type`.
    pub fn new(hash_type: HashType) -> Self {
        Self::with_entries(hash_type, std::iter::empty::<(PathBuf, Digest)>())
    }

    /// Target already holding the given `(path, digest)` entries.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_entries(hash_type: HashType, entries: impl IntoIterator<Item = (impl Into<PathBuf>, Digest)>) -> Self {
        let mut index = RemoteIndex::new(hash_type);
        for (path, digest) in entries {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockTarget::with_entries: invalid path {}", path.display());
            };
            index.insert(validated, digest);
        }
        Self {
            name: "mock".to_string(),
            index,
            fail_index: false,
            failing: HashSet::new(),
            copies: RwLock::new(Vec::new()),
            index_fetches: AtomicUsize::new(0),
        }
    }

    /// Make [`fetch_index`](SyncTarget::fetch_index) fail like a
    /// misconfigured remote would.
    pub fn with_failing_index(mut self) -> Self {
        self.fail_index = true;
        self
    }

    /// Make copies to `destination` fail.
    pub fn with_failing_copy(mut self, destination: impl Into<PathBuf>) -> Self {
        self.failing.insert(destination.into());
        self
    }

    /// Every successful copy so far, as `(local, destination)` pairs in call order.
    pub async fn copies(&self) -> Vec<(PathBuf, PathBuf)> {
        self.copies.read().await.clone()
    }

    /// Number of times the index was fetched.
    pub fn index_fetches(&self) -> usize {
        self.index_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncTarget for MockTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash_type(&self) -> HashType {
        self.index.hash_type()
    }

    async fn fetch_index(&self) -> Result<RemoteIndex> {
        self.index_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_index {
            exn::bail!(ErrorKind::ToolFailed {
                tool: "mock".to_string(),
                status: Some(3),
                stderr: "directory not found".to_string(),
            });
        }
        Ok(self.index.clone())
    }

    async fn copy(&self, local: &Path, destination: &Path, options: CopyOptions) -> Result<()> {
        let destination = validate_path(destination)?;
        if self.failing.contains(&destination) {
            exn::bail!(ErrorKind::ToolFailed {
                tool: "mock".to_string(),
                status: Some(1),
                stderr: format!("failed to copy {}", destination.display()),
            });
        }
        let mut copies = self.copies.write().await;
        if options.skip_if_exists && (self.index.digest_of(&destination).is_some() || copies.iter().any(|(_, d)| d == &destination)) {
            return Ok(());
        }
        copies.push((local.to_path_buf(), destination));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hash_bytes;

    #[tokio::test]
    async fn test_index_is_a_snapshot() {
        let target = MockTarget::new(HashType::Md5);
        target.copy(Path::new("/card/a.jpg"), Path::new("a.jpg"), CopyOptions::default()).await.unwrap();
        assert!(target.fetch_index().await.unwrap().is_empty());
        assert_eq!(target.index_fetches(), 1);
    }

    #[tokio::test]
    async fn test_skip_if_exists() {
        let existing = hash_bytes(HashType::Md5, b"old");
        let target = MockTarget::with_entries(HashType::Md5, [("taken.jpg", existing)]);
        target.copy(Path::new("/card/a.jpg"), Path::new("taken.jpg"), CopyOptions::default()).await.unwrap();
        target.copy(Path::new("/card/b.jpg"), Path::new("free.jpg"), CopyOptions::default()).await.unwrap();
        target.copy(Path::new("/card/c.jpg"), Path::new("free.jpg"), CopyOptions::default()).await.unwrap();
        assert_eq!(target.copies().await, vec![(PathBuf::from("/card/b.jpg"), PathBuf::from("free.jpg"))]);
    }

    #[tokio::test]
    async fn test_failures() {
        let target = MockTarget::new(HashType::Md5).with_failing_index().with_failing_copy("bad.jpg");
        assert!(target.fetch_index().await.is_err());
        let err = target.copy(Path::new("/card/a.jpg"), Path::new("bad.jpg"), CopyOptions::default()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(target.copies().await.is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_entries_panics_on_bad_path() {
        MockTarget::with_entries(HashType::Md5, [("../escape", hash_bytes(HashType::Md5, b""))]);
    }
}
