//! Turns the contents of a camera card into uniquely named uploads.
//!
//! [`MountLayout`] finds the media, [`ModelRules`] and [`DestinationName`]
//! decide what each file is called, and [`upload`] drives a [`Session`]
//! through the whole card.

pub mod error;
mod layout;
mod model;
mod naming;
mod upload;

pub use crate::layout::{MediaClass, MediaFile, MountLayout};
pub use crate::model::{ModelRules, RenameRule, RetainedModel, UNKNOWN_MODEL};
pub use crate::naming::DestinationName;
pub use crate::upload::{FileOutcome, FileReport, RunSummary, Session, SkipReason, UploadEvent, upload};
