//! In-memory metadata reader for testing.

use crate::error::{ErrorKind, Result};
use crate::reader::MetadataReader;
use crate::tags::TagMap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Serves preset tags by file name, ignoring the directory, and records
/// which files were read.
///
/// Files without preset tags fail the way exiftool fails on a file it
/// can't read.
#[derive(Debug, Default)]
pub struct StaticReader {
    files: HashMap<String, TagMap>,
    reads: Mutex<Vec<String>>,
}

impl StaticReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `tags` for every file named `file_name`.
    pub fn with_file<K, V>(mut self, file_name: impl Into<String>, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.files.insert(file_name.into(), tags.into_iter().collect());
        self
    }

    /// File names read so far, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().map(|reads| reads.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MetadataReader for StaticReader {
    fn name(&self) -> &str {
        "static"
    }

    async fn read_tags(&self, path: &Path) -> Result<TagMap> {
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(file_name.clone());
        }
        match self.files.get(&file_name) {
            Some(tags) => Ok(tags.clone()),
            None => exn::bail!(ErrorKind::ToolFailed {
                tool: "static".to_string(),
                status: Some(1),
                stderr: format!("Error: Unknown file type - {file_name}"),
            }),
        }
    }
}
