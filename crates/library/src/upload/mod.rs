//! Renaming and uploading the media of a mounted card.
//!
//! The primary entry point is [`upload`], which streams [`UploadEvent`]s as it
//! works through the card: first every still image, then every video. Each
//! file goes through the same pipeline:
//!
//! 1. Hash the file with the target's algorithm; skip it if the target
//!    already holds that content under any name.
//! 2. Read its metadata to get the capture time and camera model.
//! 3. Derive the [`DestinationName`](crate::DestinationName) and copy it.
//!
//! The dedup check comes first because it is much cheaper than spawning a
//! metadata reader, and on a card that was synced before nearly every file
//! is a duplicate.

mod file;
mod stream;

pub use self::file::{FileOutcome, FileReport, SkipReason};
pub use self::stream::{UploadEvent, upload};
use crate::layout::MountLayout;
use crate::model::ModelRules;
use camsync_metadata::{Extractor, ReaderHandle};
use camsync_storage::TargetHandle;

/// Everything a run needs, assembled once at startup.
pub struct Session {
    pub layout: MountLayout,
    pub target: TargetHandle,
    pub reader: ReaderHandle,
    pub extractor: Extractor,
    pub rules: ModelRules,
}

/// Per-outcome file counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: usize,
    pub duplicates: usize,
    pub unreadable: usize,
    pub metadata: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Uploaded { .. } => self.uploaded += 1,
            FileOutcome::Skipped(SkipReason::Duplicate) => self.duplicates += 1,
            FileOutcome::Skipped(SkipReason::Unreadable(_)) => self.unreadable += 1,
            FileOutcome::Skipped(SkipReason::Metadata(_)) => self.metadata += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.uploaded + self.duplicates + self.unreadable + self.metadata + self.failed
    }

    /// `true` if any file was left behind because something went wrong.
    pub fn has_problems(&self) -> bool {
        self.unreadable + self.metadata + self.failed > 0
    }
}
