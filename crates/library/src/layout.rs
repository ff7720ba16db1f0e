//! Where media lives on a camera card.
//!
//! Stills are always under `DCIM/` (DCF standard). Videos are either there
//! too, or under `PRIVATE/M4ROOT/` on Sony cameras.

use crate::error::{ErrorKind, Result};
use camsync_storage::walk;
use derive_more::Display;
use futures::StreamExt;
use std::path::{Path, PathBuf};

const DCIM: &str = "DCIM";
const SONY_VIDEO_ROOT: [&str; 2] = ["PRIVATE", "M4ROOT"];
/// macOS writes `._NAME` resource forks next to every file it touches.
const APPLE_DOUBLE_PREFIX: &str = "._";

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaClass {
    #[display("still")]
    Still,
    #[display("video")]
    Video,
}

/// A media file found on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// File name without its extension.
    pub base: String,
    /// Lowercased extension without the dot.
    pub extension: String,
    pub class: MediaClass,
}

impl MediaFile {
    /// Returns `None` for paths without a file stem or extension.
    pub fn new(path: impl Into<PathBuf>, class: MediaClass) -> Option<Self> {
        let path = path.into();
        let base = path.file_stem()?.to_string_lossy().into_owned();
        let extension = path.extension()?.to_string_lossy().to_lowercase();
        Some(Self {
            path,
            base,
            extension,
            class,
        })
    }

    /// File name as found on the card.
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// Media directories of a mounted card and the extensions to look for.
#[derive(Debug, Clone)]
pub struct MountLayout {
    mount: PathBuf,
    stills: Vec<String>,
    videos: Vec<String>,
}

impl MountLayout {
    /// Extensions are matched case-insensitively and given without the dot.
    pub fn new(mount: impl Into<PathBuf>, stills: &[String], videos: &[String]) -> Self {
        let lowercase = |extensions: &[String]| extensions.iter().map(|e| e.to_lowercase()).collect();
        Self {
            mount: mount.into(),
            stills: lowercase(stills),
            videos: lowercase(videos),
        }
    }

    pub fn dcim(&self) -> PathBuf {
        self.mount.join(DCIM)
    }

    /// Candidate video directories, in the order they are processed. Not all
    /// of them exist on every card.
    pub fn video_roots(&self) -> Vec<PathBuf> {
        vec![SONY_VIDEO_ROOT.iter().fold(self.mount.clone(), |path, part| path.join(part)), self.dcim()]
    }

    /// Every still image under `DCIM/`, sorted by path.
    ///
    /// # Errors
    ///
    /// [`NoDcim`](ErrorKind::NoDcim) if the card has no `DCIM/` directory.
    pub async fn stills(&self) -> Result<Vec<MediaFile>> {
        let dcim = self.dcim();
        if !tokio::fs::metadata(&dcim).await.is_ok_and(|metadata| metadata.is_dir()) {
            exn::bail!(ErrorKind::NoDcim(self.mount.clone()));
        }
        Ok(enumerate(&dcim, &self.stills, MediaClass::Still).await)
    }

    /// Every video under the existing video roots, root by root, each
    /// sorted by path.
    pub async fn videos(&self) -> Vec<MediaFile> {
        let mut files = Vec::new();
        for root in self.video_roots() {
            if !tokio::fs::metadata(&root).await.is_ok_and(|metadata| metadata.is_dir()) {
                tracing::debug!(root = %root.display(), "Video directory absent");
                continue;
            }
            files.extend(enumerate(&root, &self.videos, MediaClass::Video).await);
        }
        files
    }
}

/// Files below `root` whose lowercased extension is in `extensions`.
///
/// Entries that can't be read (dangling links, permission errors) are logged
/// and left out; they never stop the other files from being found.
async fn enumerate(root: &Path, extensions: &[String], class: MediaClass) -> Vec<MediaFile> {
    let mut files: Vec<MediaFile> = walk(root)
        .filter_map(|entry| async move {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = ?e, "Skipping unreadable entry");
                    return None;
                },
            };
            MediaFile::new(path, class)
                .filter(|file| extensions.contains(&file.extension))
                .filter(|file| !file.file_name().starts_with(APPLE_DOUBLE_PREFIX))
        })
        .collect()
        .await;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), %class, files = files.len(), "Enumerated media files");
    files
}
