//! Sync target backed by the `rclone` command-line tool.
//!
//! Every remote rclone knows about (WebDAV/Nextcloud, S3, SFTP, Google
//! Drive...) becomes usable as a target without linking a single SDK. The
//! trade-off is that the hash algorithm has to be one the remote supports;
//! WebDAV-style remotes generally only offer MD5 and SHA-1.

use crate::digest::{Digest, HashType};
use crate::error::{ErrorKind, Result};
use crate::index::RemoteIndex;
use crate::target::{CopyOptions, SyncTarget};
use crate::validate_path;
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::instrument;

const TOOL: &str = "rclone";

/// A single entry of `rclone lsjson` output. Only the fields we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    path: String,
    #[serde(default)]
    is_dir: bool,
    #[serde(default)]
    hashes: HashMap<String, String>,
}

/// rclone-backed sync target.
///
/// # Examples
///
/// ```no_run
/// use camsync_storage::{HashType, target::RcloneTarget};
///
/// # fn example() -> camsync_storage::error::Result<()> {
/// let target = RcloneTarget::new("sciebo", "rclone", "sciebo:DCIM/", HashType::Md5)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RcloneTarget {
    name: String,
    binary: PathBuf,
    remote: String,
    hash_type: HashType,
}

impl RcloneTarget {
    /// Create a new rclone target.
    ///
    /// # Arguments
    /// * `name` - A name for this target (used in logging)
    /// * `binary` - rclone executable, either a name looked up in `PATH` or a path
    /// * `remote` - rclone remote spec, e.g. `sciebo:DCIM/` or `/mnt/backup`
    /// * `hash_type` - digest algorithm requested from the remote
    ///
    /// # Errors
    ///
    /// Returns [`ToolNotFound`](ErrorKind::ToolNotFound) if the executable
    /// can't be resolved. Whether the remote exists is only known once
    /// [`fetch_index`](SyncTarget::fetch_index) runs.
    pub fn new(
        name: impl Into<String>,
        binary: impl AsRef<OsStr>,
        remote: impl Into<String>,
        hash_type: HashType,
    ) -> Result<Self> {
        let binary = binary.as_ref();
        let resolved = which::which(binary).or_raise(|| ErrorKind::ToolNotFound(binary.to_string_lossy().into_owned()))?;
        tracing::debug!(binary = %resolved.display(), "Resolved rclone executable");
        Ok(Self {
            name: name.into(),
            binary: resolved,
            remote: remote.into(),
            hash_type,
        })
    }

    /// Full rclone path of a destination below the configured remote.
    fn remote_path(&self, destination: &Path) -> Result<String> {
        let validated = validate_path(destination)?;
        let relative = validated.to_str().ok_or_raise(|| ErrorKind::InvalidPath(validated.clone()))?;
        Ok(if self.remote.is_empty() || self.remote.ends_with(':') || self.remote.ends_with('/') {
            format!("{}{}", self.remote, relative)
        } else {
            format!("{}/{}", self.remote, relative)
        })
    }

    fn lsjson_args(&self) -> Vec<OsString> {
        ["lsjson", "--recursive", "--files-only", "--hash", "--hash-type", self.hash_type.as_str(), self.remote.as_str()]
            .into_iter()
            .map(OsString::from)
            .collect()
    }

    fn copyto_args(&self, local: &Path, destination: &Path, options: CopyOptions) -> Result<Vec<OsString>> {
        let mut args = vec![OsString::from("copyto"), local.as_os_str().to_os_string()];
        args.push(self.remote_path(destination)?.into());
        if options.skip_if_exists {
            args.push("--ignore-existing".into());
        }
        Ok(args)
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>> {
        let output = Command::new(&self.binary)
            .args(&args)
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
        Ok(output.stdout)
    }
}

/// Turn `rclone lsjson --hash` output into an index.
///
/// Entries without a digest for `hash_type` are left out. If there are
/// entries but *none* of them carry a digest the remote doesn't support the
/// algorithm, and an index with no digests would silently disable dedup.
fn parse_listing(json: &[u8], hash_type: HashType) -> Result<RemoteIndex> {
    let entries: Vec<ListEntry> =
        serde_json::from_slice(json).or_raise(|| ErrorKind::InvalidResponse("rclone lsjson output".to_string()))?;
    let mut index = RemoteIndex::new(hash_type);
    let mut files = 0usize;
    let mut unhashed = 0usize;
    for entry in entries.into_iter().filter(|e| !e.is_dir) {
        files += 1;
        let Some(hex) = entry.hashes.get(hash_type.as_str()).filter(|h| !h.is_empty()) else {
            unhashed += 1;
            tracing::debug!(path = %entry.path, hash = %hash_type, "Remote entry has no digest");
            continue;
        };
        index.insert(entry.path, Digest::from_hex(hex)?);
    }
    if files > 0 && unhashed == files {
        exn::bail!(ErrorKind::UnsupportedHash(hash_type.to_string()));
    }
    if unhashed > 0 {
        tracing::warn!(unhashed, files, hash = %hash_type, "Some remote entries have no digest and can't be used for dedup");
    }
    Ok(index)
}

#[async_trait]
impl SyncTarget for RcloneTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    #[instrument(skip(self), fields(target = %self.name, remote = %self.remote))]
    async fn fetch_index(&self) -> Result<RemoteIndex> {
        let stdout = self.run(self.lsjson_args()).await?;
        let index = parse_listing(&stdout, self.hash_type)?;
        tracing::debug!(entries = index.len(), "Fetched remote index");
        Ok(index)
    }

    #[instrument(skip(self, options), fields(target = %self.name, local = %local.display(), destination = %destination.display()))]
    async fn copy(&self, local: &Path, destination: &Path, options: CopyOptions) -> Result<()> {
        let args = self.copyto_args(local, destination, options)?;
        self.run(args).await?;
        Ok(())
    }
}
