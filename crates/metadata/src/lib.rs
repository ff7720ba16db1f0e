//! Capture metadata for camsync.
//!
//! A [`MetadataReader`] turns a file into a [`TagMap`] of raw tags, and an
//! [`Extractor`] turns that into the capture time and camera model a
//! destination name is built from.

pub mod error;
mod exiftool;
mod extract;
#[cfg(feature = "mock")]
mod mock;
mod reader;
mod tags;
mod timestamp;

pub use crate::exiftool::ExifTool;
pub use crate::extract::{
    Extractor, MediaMetadata, ModelSource, STILL_MAKE_TAG, STILL_MODEL_TAG, STILL_OFFSET_TAG, TimestampCandidate,
    TimestampSource, VIDEO_MAKE_TAGS, VIDEO_MODEL_TAGS, Zone,
};
#[cfg(feature = "mock")]
pub use crate::mock::StaticReader;
pub use crate::reader::MetadataReader;
pub use crate::tags::TagMap;
pub use crate::timestamp::Timestamp;
use std::sync::Arc;

pub type ReaderHandle = Arc<dyn MetadataReader + Send + Sync>;
