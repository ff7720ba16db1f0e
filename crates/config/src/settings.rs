//! Configuration sections.
//!
//! Each section maps to a table of the configuration file. Every field has a
//! default, so any file only needs the keys it wants to change.

use crate::error::{ErrorKind, Result};
use camsync_storage::HashType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::UtcOffset;
use time::macros::format_description;

/// Root configuration structure containing all sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where media gets uploaded to.
    pub target: TargetConfig,
    /// Which files on the card count as media.
    pub media: MediaConfig,
    /// How capture metadata is read.
    pub metadata: MetadataConfig,
    /// How camera model names are cleaned up for file names.
    pub models: ModelsConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Any remote the `rclone` tool is configured for.
    #[default]
    Rclone,
    /// A directory on this machine, e.g. a mounted network share.
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub kind: TargetKind,
    /// rclone remote spec (`kind = "rclone"`).
    pub remote: String,
    /// Absolute directory (`kind = "local"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Digest algorithm used for dedup; see [`TargetConfig::hash_type`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashType>,
    /// rclone executable, either a name looked up in `PATH` or a path.
    pub rclone: String,
}
impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: TargetKind::default(),
            remote: "sciebo:DCIM/".to_string(),
            path: None,
            hash: None,
            rclone: "rclone".to_string(),
        }
    }
}
impl TargetConfig {
    /// The configured hash algorithm, or the best default for the target kind.
    ///
    /// Nearly every rclone remote can report MD5, while a local directory is
    /// hashed by us and BLAKE3 is the fastest option there.
    pub fn hash_type(&self) -> HashType {
        self.hash.unwrap_or(match self.kind {
            TargetKind::Rclone => HashType::Md5,
            TargetKind::Local => HashType::Blake3,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Still image extensions, matched case-insensitively, without the dot.
    pub stills: Vec<String>,
    /// Video extensions, matched case-insensitively, without the dot.
    pub videos: Vec<String>,
    /// Offset assumed for capture times recorded without one, as `+HH:MM`.
    pub fallback_offset: String,
}
impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            stills: ["JPG", "HEIC", "HIF", "RW2", "CR2", "CR3", "ORF", "ARW", "DNG"].map(String::from).to_vec(),
            videos: vec!["MP4".to_string()],
            fallback_offset: "+01:00".to_string(),
        }
    }
}
impl MediaConfig {
    /// Parse [`fallback_offset`](Self::fallback_offset).
    ///
    /// Accepts `+HH:MM`/`-HH:MM`, or `Z`/`UTC` for a zero offset.
    ///
    /// # Example
    ///
    /// ```
    /// use camsync_config::MediaConfig;
    ///
    /// let media = MediaConfig { fallback_offset: "-05:30".to_string(), ..Default::default() };
    /// assert_eq!(media.fallback_offset().unwrap().whole_minutes(), -330);
    /// ```
    pub fn fallback_offset(&self) -> Result<UtcOffset> {
        let value = self.fallback_offset.trim();
        if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
            return Ok(UtcOffset::UTC);
        }
        let offset = UtcOffset::parse(value, format_description!("[offset_hour sign:mandatory]:[offset_minute]"))
            .map_err(|e| ErrorKind::invalid("media.fallback_offset", format!("expected +HH:MM, got {value:?} ({e})")))?;
        Ok(offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// exiftool executable, either a name looked up in `PATH` or a path.
    pub exiftool: String,
    /// Group-qualified tag holding the capture time of still images.
    pub capture_tag: String,
}
impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            exiftool: "exiftool".to_string(),
            capture_tag: "EXIF:DateTimeOriginal".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Remove the manufacturer name from the model (`SONY DSC-RX100` → `DSC-RX100`).
    pub trim_make: bool,
    /// Rename rules, tried in order; only the first match applies.
    pub rename: Vec<RenameConfig>,
}
impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            trim_make: true,
            rename: vec![RenameConfig {
                pattern: "DSC-".to_string(),
                replacement: String::new(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl Config {
    /// Check the values serde can't.
    pub fn validate(&self) -> Result<()> {
        match self.target.kind {
            TargetKind::Rclone => {
                if self.target.remote.trim().is_empty() {
                    exn::bail!(ErrorKind::invalid("target.remote", "required for rclone targets"));
                }
                if self.target.rclone.trim().is_empty() {
                    exn::bail!(ErrorKind::invalid("target.rclone", "must not be empty"));
                }
            },
            TargetKind::Local => match &self.target.path {
                None => exn::bail!(ErrorKind::invalid("target.path", "required for local targets")),
                Some(path) if !path.is_absolute() => {
                    exn::bail!(ErrorKind::invalid("target.path", format!("must be absolute, got {}", path.display())))
                },
                Some(_) => {},
            },
        }
        validate_extensions("media.stills", &self.media.stills)?;
        validate_extensions("media.videos", &self.media.videos)?;
        self.media.fallback_offset()?;
        if self.metadata.exiftool.trim().is_empty() {
            exn::bail!(ErrorKind::invalid("metadata.exiftool", "must not be empty"));
        }
        if !self.metadata.capture_tag.contains(':') {
            exn::bail!(ErrorKind::invalid(
                "metadata.capture_tag",
                format!("expected a group-qualified tag like EXIF:DateTimeOriginal, got {:?}", self.metadata.capture_tag)
            ));
        }
        if let Some(position) = self.models.rename.iter().position(|rule| rule.pattern.is_empty()) {
            exn::bail!(ErrorKind::invalid(format!("models.rename[{position}].pattern"), "must not be empty"));
        }
        Ok(())
    }
}

fn validate_extensions(key: &str, extensions: &[String]) -> Result<()> {
    if extensions.is_empty() {
        exn::bail!(ErrorKind::invalid(key, "at least one extension is required"));
    }
    for extension in extensions {
        if extension.is_empty() || extension.starts_with('.') || extension.contains(['/', '\\']) {
            exn::bail!(ErrorKind::invalid(key, format!("{extension:?} is not a bare extension like \"JPG\"")));
        }
    }
    Ok(())
}
