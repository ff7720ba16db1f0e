//! Metadata reader backed by the `exiftool` command-line tool.
//!
//! exiftool understands every still and video format cameras write, vendor
//! makernotes and Sony's XML sidecar data included, which no single Rust
//! crate does.

use crate::error::{ErrorKind, Result};
use crate::reader::MetadataReader;
use crate::tags::TagMap;
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use serde_json::{Map, Value};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::instrument;

const TOOL: &str = "exiftool";

#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: PathBuf,
}

impl ExifTool {
    /// Resolve the exiftool executable, either a name looked up in `PATH`
    /// or a path.
    ///
    /// # Errors
    ///
    /// Returns [`ToolNotFound`](ErrorKind::ToolNotFound) if it can't be found.
    pub fn new(binary: impl AsRef<OsStr>) -> Result<Self> {
        let binary = binary.as_ref();
        let resolved = which::which(binary).or_raise(|| ErrorKind::ToolNotFound(binary.to_string_lossy().into_owned()))?;
        tracing::debug!(binary = %resolved.display(), "Resolved exiftool executable");
        Ok(Self { binary: resolved })
    }

    fn args(path: &Path) -> Vec<OsString> {
        // -G: prefix tags with their group (EXIF:Model).
        // LargeFileSupport: videos regularly exceed 4 GiB.
        let mut args: Vec<OsString> = ["-json", "-G", "-api", "LargeFileSupport=1"].into_iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_os_string());
        args
    }
}

/// Parse `exiftool -json -G` output for a single file.
fn parse_output(json: &[u8]) -> Result<TagMap> {
    let files: Vec<Map<String, Value>> =
        serde_json::from_slice(json).or_raise(|| ErrorKind::InvalidResponse("exiftool JSON output".to_string()))?;
    let file = files
        .into_iter()
        .next()
        .ok_or_raise(|| ErrorKind::InvalidResponse("exiftool reported no files".to_string()))?;
    Ok(file
        .into_iter()
        .filter(|(tag, _)| tag != "SourceFile")
        .filter_map(|(tag, value)| Some((tag, render(value)?)))
        .collect())
}

/// Render a JSON value as exiftool would print it.
fn render(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => Some(items.into_iter().filter_map(render).collect::<Vec<_>>().join(", ")),
        Value::Null | Value::Object(_) => None,
    }
}

#[async_trait]
impl MetadataReader for ExifTool {
    fn name(&self) -> &str {
        TOOL
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_tags(&self, path: &Path) -> Result<TagMap> {
        let output = Command::new(&self.binary)
            .args(Self::args(path))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ErrorKind::Io)?;
        if !output.status.success() {
            exn::bail!(ErrorKind::ToolFailed {
                tool: TOOL.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let tags = parse_output(&output.stdout)?;
        tracing::trace!(tags = tags.len(), "Read metadata tags");
        Ok(tags)
    }
}
