//! Turning [`Config`] into the pieces of a [`Session`].

use crate::error::{ErrorKind, Result};
use camsync_config::{Config, ModelsConfig, TargetConfig, TargetKind};
use camsync_library::{ModelRules, MountLayout, RenameRule, Session};
use camsync_metadata::{ExifTool, Extractor};
use camsync_storage::TargetHandle;
use camsync_storage::target::{LocalTarget, RcloneTarget, ReadOnlyTarget};
use exn::{OptionExt, ResultExt};
use std::path::Path;
use std::sync::Arc;

pub fn build(config: &Config, mount: &Path, dry_run: bool) -> Result<Session> {
    let exiftool = ExifTool::new(&config.metadata.exiftool).or_raise(|| ErrorKind::Setup("exiftool"))?;
    let fallback_offset = config.media.fallback_offset().or_raise(|| ErrorKind::Config)?;
    Ok(Session {
        layout: MountLayout::new(mount, &config.media.stills, &config.media.videos),
        target: target(&config.target, dry_run)?,
        reader: Arc::new(exiftool),
        extractor: Extractor::new(&config.metadata.capture_tag, fallback_offset),
        rules: rules(&config.models),
    })
}

pub fn target(config: &TargetConfig, dry_run: bool) -> Result<TargetHandle> {
    let target: TargetHandle = match config.kind {
        TargetKind::Rclone => Arc::new(
            RcloneTarget::new("rclone", &config.rclone, &config.remote, config.hash_type())
                .or_raise(|| ErrorKind::Setup("rclone target"))?,
        ),
        TargetKind::Local => {
            let root = config.path.as_deref().ok_or_raise(|| ErrorKind::Config)?;
            Arc::new(LocalTarget::new("local", root, config.hash_type()).or_raise(|| ErrorKind::Setup("local target"))?)
        },
    };
    if dry_run {
        tracing::warn!(target = target.name(), "Dry run: nothing will be uploaded");
        return Ok(Arc::new(ReadOnlyTarget::new(target)));
    }
    Ok(target)
}

pub fn rules(config: &ModelsConfig) -> ModelRules {
    ModelRules {
        trim_make: config.trim_make,
        rename: config
            .rename
            .iter()
            .map(|rule| RenameRule::new(&rule.pattern, &rule.replacement))
            .collect(),
    }
}
