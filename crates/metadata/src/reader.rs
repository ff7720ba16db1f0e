use crate::error::Result;
use crate::tags::TagMap;
use async_trait::async_trait;
use std::path::Path;

/// Source of raw metadata tags.
///
/// Implementations return every tag they can read, keyed by group-qualified
/// name; deciding which tags matter is left to the
/// [`Extractor`](crate::Extractor).
#[async_trait]
pub trait MetadataReader: Send + Sync {
    /// Name of the reader, used for logging.
    fn name(&self) -> &str;

    /// Read the tags of a single local file.
    async fn read_tags(&self, path: &Path) -> Result<TagMap>;
}
