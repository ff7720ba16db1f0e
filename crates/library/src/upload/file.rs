use crate::layout::{MediaClass, MediaFile};
use crate::model::RetainedModel;
use crate::naming::{DestinationName, NameLedger};
use crate::upload::Session;
use camsync_metadata::error::Error as MetadataError;
use camsync_storage::error::Error as StorageError;
use camsync_storage::{CopyOptions, RemoteIndex, hash_file};
use tracing::instrument;

/// Why a file was not uploaded, short of the upload itself failing.
#[derive(Debug)]
pub enum SkipReason {
    /// The target already holds this content.
    Duplicate,
    /// The file could not be read for hashing.
    Unreadable(StorageError),
    /// Metadata could not be read, or lacked something required.
    Metadata(MetadataError),
}

/// The outcome of processing a single file.
#[derive(Debug)]
pub enum FileOutcome {
    Uploaded { destination: DestinationName },
    Skipped(SkipReason),
    /// The sync target rejected the copy.
    Failed(StorageError),
}

impl FileOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub file: MediaFile,
    pub outcome: FileOutcome,
}

/// Mutable state carried from one file to the next.
pub(crate) struct RunState<'a> {
    pub(crate) index: &'a RemoteIndex,
    pub(crate) ledger: NameLedger,
    pub(crate) retained: RetainedModel,
}

/// Take one file through the whole pipeline. Never fails: every problem is
/// reported as the file's [`FileOutcome`].
#[instrument(skip_all, fields(path = %file.path.display(), class = %file.class))]
pub(crate) async fn process_file(session: &Session, state: &mut RunState<'_>, file: &MediaFile) -> FileOutcome {
    let digest = match hash_file(&file.path, state.index.hash_type()).await {
        Ok(digest) => digest,
        Err(e) => {
            tracing::error!(error = ?e, "Could not hash file");
            return FileOutcome::Skipped(SkipReason::Unreadable(e));
        },
    };
    if state.index.contains_digest(&digest) {
        tracing::debug!(%digest, "Target already holds this content");
        return FileOutcome::Skipped(SkipReason::Duplicate);
    }

    let tags = match session.reader.read_tags(&file.path).await {
        Ok(tags) => tags,
        Err(e) => {
            tracing::error!(reader = session.reader.name(), error = ?e, "Could not read metadata");
            return FileOutcome::Skipped(SkipReason::Metadata(e));
        },
    };
    let extracted = match file.class {
        MediaClass::Still => session.extractor.still(&tags),
        MediaClass::Video => session.extractor.video(&tags),
    };
    let metadata = match extracted {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::error!(error = ?e, "Unusable metadata");
            return FileOutcome::Skipped(SkipReason::Metadata(e));
        },
    };
    tracing::debug!(source = %metadata.timestamp_source.tag, captured = %metadata.captured, "Capture time");

    let model = match &metadata.model {
        Some(model) => session.rules.normalize(model, metadata.make.as_deref()),
        None if state.retained.is_unknown() => {
            tracing::warn!("No model recorded and no still image to borrow one from");
            state.retained.get().to_string()
        },
        None => {
            tracing::info!(model = state.retained.get(), "No model recorded; using the last still image's");
            state.retained.get().to_string()
        },
    };
    if file.class == MediaClass::Still {
        state.retained.retain(model.clone());
    }

    let name = DestinationName::derive(metadata.captured, &model, &file.base, &file.extension);
    let destination = state.ledger.claim(name, &digest);
    match session.target.copy(&file.path, &destination.to_path_buf(), CopyOptions::default()).await {
        Ok(()) => {
            tracing::info!(%destination, "Uploaded");
            FileOutcome::Uploaded { destination }
        },
        Err(e) => {
            tracing::error!(target = session.target.name(), %destination, error = ?e, "Upload failed");
            FileOutcome::Failed(e)
        },
    }
}
