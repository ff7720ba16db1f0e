//! Dry-run sync target.
//!
//! Wraps another target: the index is still fetched for real (so dedup and
//! naming behave exactly as they would), but copies are only logged.

use async_trait::async_trait;
use std::path::Path;

use crate::{
    TargetHandle,
    digest::HashType,
    error::Result,
    index::RemoteIndex,
    target::{CopyOptions, SyncTarget},
};

/// Read-only sync target.
///
/// Silently drops every copy, logging an [`info event`](tracing::Event) and
/// reporting success.
#[derive(Clone)]
pub struct ReadOnlyTarget {
    inner: TargetHandle,
}
impl ReadOnlyTarget {
    pub fn new(inner: TargetHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncTarget for ReadOnlyTarget {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn hash_type(&self) -> HashType {
        self.inner.hash_type()
    }

    async fn fetch_index(&self) -> Result<RemoteIndex> {
        self.inner.fetch_index().await
    }

    async fn copy(&self, local: &Path, destination: &Path, _options: CopyOptions) -> Result<()> {
        tracing::info!(
            target = self.inner.name(),
            local = %local.display(),
            destination = %destination.display(),
            "Skipping copy during dry run"
        );
        Ok(())
    }
}
