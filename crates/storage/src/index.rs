//! Snapshot of what a sync target already holds.

use crate::digest::{Digest, HashType};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Remote entry paths and their content digests, fetched once per run.
///
/// The snapshot is never updated while a run is in progress: files uploaded
/// during the run are not reflected, so two identical local files may both be
/// dispatched. That is harmless, the second copy is a no-op at the target.
#[derive(Debug, Clone, Default)]
pub struct RemoteIndex {
    hash_type: HashType,
    entries: HashMap<PathBuf, Digest>,
    digests: HashSet<Digest>,
}

impl RemoteIndex {
    /// An empty index whose digests are (or will be) in `hash_type`.
    pub fn new(hash_type: HashType) -> Self {
        Self {
            hash_type,
            entries: HashMap::new(),
            digests: HashSet::new(),
        }
    }

    /// Build an index from `(remote path, digest)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use camsync_storage::{Digest, HashType, RemoteIndex};
    ///
    /// let digest = Digest::from_hex("900150983cd24fb0d6963f7d28e17f72").unwrap();
    /// let index = RemoteIndex::from_entries(HashType::Md5, [("20230601_143000_RX100_IMG_0001.jpg", digest.clone())]);
    /// assert!(index.contains_digest(&digest));
    /// ```
    pub fn from_entries(
        hash_type: HashType,
        entries: impl IntoIterator<Item = (impl Into<PathBuf>, Digest)>,
    ) -> Self {
        let mut index = Self::new(hash_type);
        for (path, digest) in entries {
            index.insert(path, digest);
        }
        index
    }

    pub(crate) fn insert(&mut self, path: impl Into<PathBuf>, digest: Digest) {
        self.digests.insert(digest.clone());
        if let Some(replaced) = self.entries.insert(path.into(), digest) {
            // Only drop the replaced digest if no other entry still has it.
            if !self.entries.values().any(|d| d == &replaced) {
                self.digests.remove(&replaced);
            }
        }
    }

    /// Algorithm the digests in this index were computed with. Local files
    /// must be hashed with the same one before checking membership.
    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Is there any entry, under any name, with this content?
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.digests.contains(digest)
    }

    /// Digest of the entry stored at `path`, if there is one.
    pub fn digest_of(&self, path: impl AsRef<Path>) -> Option<&Digest> {
        self.entries.get(path.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Digest)> {
        self.entries.iter().map(|(path, digest)| (path.as_path(), digest))
    }
}
