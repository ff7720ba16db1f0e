//! From raw tags to the handful of values a destination name needs.

use crate::error::{ErrorKind, Result};
use crate::tags::TagMap;
use crate::timestamp::Timestamp;
use exn::OptionExt;
use time::{OffsetDateTime, UtcOffset};

pub const STILL_MAKE_TAG: &str = "EXIF:Make";
pub const STILL_MODEL_TAG: &str = "EXIF:Model";
/// Zone of `EXIF:DateTimeOriginal`, written by most cameras since EXIF 2.31.
pub const STILL_OFFSET_TAG: &str = "EXIF:OffsetTimeOriginal";
pub const VIDEO_MODEL_TAGS: [&str; 2] = ["QuickTime:Model", "XML:DeviceModelName"];
pub const VIDEO_MAKE_TAGS: [&str; 2] = ["QuickTime:Make", "XML:DeviceManufacturer"];

/// How a timestamp candidate's zone is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The value must carry its own offset; naive values are rejected.
    Embedded,
    /// Naive values are placed in the fallback offset. An offset in the
    /// value itself still wins.
    Fallback,
}

/// One entry of an ordered timestamp fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampCandidate {
    pub tag: String,
    pub zone: Zone,
}
impl TimestampCandidate {
    pub fn new(tag: impl Into<String>, zone: Zone) -> Self {
        Self { tag: tag.into(), zone }
    }

    /// Default chain for videos, most to least trustworthy.
    ///
    /// 1. `QuickTime:CreationDate`: local time with the camera's own zone.
    /// 2. `QuickTime:CreateDate`: no zone, approximated with the fallback
    ///    offset (wrong by an hour across daylight saving changes).
    /// 3. `File:FileModifyDate`: when the file was last written.
    pub fn video_chain() -> Vec<Self> {
        vec![
            Self::new("QuickTime:CreationDate", Zone::Embedded),
            Self::new("QuickTime:CreateDate", Zone::Fallback),
            Self::new("File:FileModifyDate", Zone::Embedded),
        ]
    }
}

/// Where a capture time came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampSource {
    /// Tag the value was read from.
    pub tag: String,
    /// `true` if the zone is the configured fallback rather than the device's.
    pub assumed_offset: bool,
}

/// Where a camera model came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Tag(String),
    /// No model tag; the caller decides what to use instead.
    Missing,
}

/// Everything needed to name a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Capture time, in the zone it was recorded in.
    pub captured: OffsetDateTime,
    pub timestamp_source: TimestampSource,
    pub make: Option<String>,
    pub model: Option<String>,
    pub model_source: ModelSource,
}

/// Turns [`TagMap`]s into [`MediaMetadata`].
///
/// Stills are strict: make, model and capture time must all be present. Videos
/// walk a [`TimestampCandidate`] chain and may lack a model entirely.
#[derive(Debug, Clone)]
pub struct Extractor {
    capture_tag: String,
    fallback_offset: UtcOffset,
    video_chain: Vec<TimestampCandidate>,
}

impl Extractor {
    /// # Arguments
    /// * `capture_tag` - tag holding the capture time of stills
    /// * `fallback_offset` - zone assumed for values recorded without one
    pub fn new(capture_tag: impl Into<String>, fallback_offset: UtcOffset) -> Self {
        Self {
            capture_tag: capture_tag.into(),
            fallback_offset,
            video_chain: TimestampCandidate::video_chain(),
        }
    }

    pub fn with_video_chain(mut self, chain: Vec<TimestampCandidate>) -> Self {
        self.video_chain = chain;
        self
    }

    /// Metadata of a still image.
    ///
    /// # Errors
    ///
    /// [`MissingTag`](ErrorKind::MissingTag) if make, model or capture time is
    /// absent, [`InvalidTimestamp`](ErrorKind::InvalidTimestamp) if the capture
    /// time isn't a date.
    pub fn still(&self, tags: &TagMap) -> Result<MediaMetadata> {
        let make = require(tags, STILL_MAKE_TAG)?;
        let model = require(tags, STILL_MODEL_TAG)?;
        let value = require(tags, &self.capture_tag)?;
        let timestamp = Timestamp::parse(value).ok_or_raise(|| ErrorKind::InvalidTimestamp {
            tag: self.capture_tag.clone(),
            value: value.to_string(),
        })?;
        let embedded = tags.get(STILL_OFFSET_TAG).and_then(parse_offset);
        let (captured, assumed_offset) = match (timestamp, embedded) {
            (Timestamp::Aware(aware), _) => (aware, false),
            (Timestamp::Naive(naive), Some(offset)) => (naive.assume_offset(offset), false),
            (Timestamp::Naive(naive), None) => (naive.assume_offset(self.fallback_offset), true),
        };
        Ok(MediaMetadata {
            captured,
            timestamp_source: TimestampSource {
                tag: self.capture_tag.clone(),
                assumed_offset,
            },
            make: Some(make.to_string()),
            model: Some(model.to_string()),
            model_source: ModelSource::Tag(STILL_MODEL_TAG.to_string()),
        })
    }

    /// Metadata of a video.
    ///
    /// # Errors
    ///
    /// [`NoTimestamp`](ErrorKind::NoTimestamp) if no candidate of the chain
    /// yields a timestamp. A missing model is not an error.
    pub fn video(&self, tags: &TagMap) -> Result<MediaMetadata> {
        let (captured, timestamp_source) = self.first_timestamp(tags)?;
        let make = tags.first_of(&VIDEO_MAKE_TAGS).map(|(_, make)| make.to_string());
        let (model, model_source) = match tags.first_of(&VIDEO_MODEL_TAGS) {
            Some((tag, model)) => (Some(model.to_string()), ModelSource::Tag(tag.to_string())),
            None => (None, ModelSource::Missing),
        };
        Ok(MediaMetadata {
            captured,
            timestamp_source,
            make,
            model,
            model_source,
        })
    }

    fn first_timestamp(&self, tags: &TagMap) -> Result<(OffsetDateTime, TimestampSource)> {
        for candidate in &self.video_chain {
            let Some(value) = tags.get(&candidate.tag) else {
                tracing::trace!(tag = %candidate.tag, "Timestamp candidate absent");
                continue;
            };
            let resolved = match (Timestamp::parse(value), candidate.zone) {
                (Some(Timestamp::Aware(aware)), _) => Some((aware, false)),
                (Some(Timestamp::Naive(naive)), Zone::Fallback) => Some((naive.assume_offset(self.fallback_offset), true)),
                (Some(Timestamp::Naive(_)), Zone::Embedded) | (None, _) => None,
            };
            let Some((captured, assumed_offset)) = resolved else {
                tracing::debug!(tag = %candidate.tag, value, "Timestamp candidate unusable");
                continue;
            };
            if assumed_offset {
                tracing::warn!(
                    tag = %candidate.tag,
                    offset = %self.fallback_offset,
                    "Capture time has no zone; assuming the fallback offset, which ignores daylight saving"
                );
            } else {
                tracing::debug!(tag = %candidate.tag, "Using timestamp candidate");
            }
            return Ok((
                captured,
                TimestampSource {
                    tag: candidate.tag.clone(),
                    assumed_offset,
                },
            ));
        }
        exn::bail!(ErrorKind::NoTimestamp(self.video_chain.iter().map(|c| c.tag.clone()).collect()));
    }
}

fn require<'a>(tags: &'a TagMap, tag: &str) -> Result<&'a str> {
    tags.get(tag).ok_or_raise(|| ErrorKind::MissingTag(tag.to_string()))
}

fn parse_offset(value: &str) -> Option<UtcOffset> {
    UtcOffset::parse(value, time::macros::format_description!("[offset_hour sign:mandatory]:[offset_minute]")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn extractor() -> Extractor {
        Extractor::new("EXIF:DateTimeOriginal", offset!(+1))
    }

    fn rx100_still() -> TagMap {
        TagMap::from_iter([
            ("EXIF:Make", "SONY"),
            ("EXIF:Model", "SONY DSC-RX100"),
            ("EXIF:DateTimeOriginal", "2023:06:01 14:30:00"),
        ])
    }

    #[test]
    fn test_still() {
        let metadata = extractor().still(&rx100_still()).unwrap();
        assert_eq!(metadata.captured, datetime!(2023-06-01 14:30:00 +01:00));
        assert!(metadata.timestamp_source.assumed_offset);
        assert_eq!(metadata.make.as_deref(), Some("SONY"));
        assert_eq!(metadata.model.as_deref(), Some("SONY DSC-RX100"));
        assert_eq!(metadata.model_source, ModelSource::Tag("EXIF:Model".to_string()));
    }

    #[test]
    fn test_still_prefers_recorded_offset() {
        let mut tags = rx100_still();
        tags.insert("EXIF:OffsetTimeOriginal", "+02:00");
        let metadata = extractor().still(&tags).unwrap();
        assert_eq!(metadata.captured.offset(), offset!(+2));
        // The wall clock is untouched.
        assert_eq!(metadata.captured.hour(), 14);
        assert!(!metadata.timestamp_source.assumed_offset);
    }

    #[test]
    fn test_still_capture_tag_is_configurable() {
        let tags = TagMap::from_iter([
            ("EXIF:Make", "Canon"),
            ("EXIF:Model", "Canon EOS R6"),
            ("EXIF:ModifyDate", "2022:01:02 03:04:05"),
        ]);
        assert!(extractor().still(&tags).is_err());
        let metadata = Extractor::new("EXIF:ModifyDate", offset!(UTC)).still(&tags).unwrap();
        assert_eq!(metadata.captured, datetime!(2022-01-02 03:04:05 UTC));
        assert_eq!(metadata.timestamp_source.tag, "EXIF:ModifyDate");
    }

    #[rstest::rstest]
    #[case("EXIF:Make")]
    #[case("EXIF:Model")]
    #[case("EXIF:DateTimeOriginal")]
    fn test_still_required_tags(#[case] missing: &str) {
        let tags = TagMap::from_iter(
            [
                ("EXIF:Make", "SONY"),
                ("EXIF:Model", "SONY DSC-RX100"),
                ("EXIF:DateTimeOriginal", "2023:06:01 14:30:00"),
            ]
            .into_iter()
            .filter(|(tag, _)| *tag != missing),
        );
        let err = extractor().still(&tags).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingTag(tag) if tag == missing));
    }

    #[test]
    fn test_still_unparsable_timestamp() {
        let mut tags = rx100_still();
        tags.insert("EXIF:DateTimeOriginal", "0000:00:00 00:00:00");
        let err = extractor().still(&tags).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_video_chain_prefers_creation_date() {
        let tags = TagMap::from_iter([
            ("QuickTime:CreationDate", "2023:06:02 11:00:00+02:00"),
            ("QuickTime:CreateDate", "2023:06:02 09:00:00"),
            ("File:FileModifyDate", "2023:06:03 10:00:00+02:00"),
        ]);
        let metadata = extractor().video(&tags).unwrap();
        assert_eq!(metadata.captured, datetime!(2023-06-02 11:00:00 +02:00));
        assert_eq!(metadata.timestamp_source.tag, "QuickTime:CreationDate");
        assert!(!metadata.timestamp_source.assumed_offset);
    }

    #[test]
    fn test_video_chain_generic_date_uses_fallback_offset() {
        let tags = TagMap::from_iter([
            ("QuickTime:CreationDate", "not a date"),
            ("QuickTime:CreateDate", "2023:06:02 09:00:00"),
            ("File:FileModifyDate", "2023:06:03 10:00:00+02:00"),
        ]);
        let metadata = extractor().video(&tags).unwrap();
        assert_eq!(metadata.captured, datetime!(2023-06-02 09:00:00 +01:00));
        assert_eq!(metadata.captured.offset(), offset!(+1));
        assert_eq!(metadata.timestamp_source.tag, "QuickTime:CreateDate");
        assert!(metadata.timestamp_source.assumed_offset);
    }

    #[test]
    fn test_video_chain_file_modify_date_last() {
        let tags = TagMap::from_iter([
            ("QuickTime:CreateDate", "0000:00:00 00:00:00"),
            ("File:FileModifyDate", "2023:06:02 09:00:00+02:00"),
        ]);
        let metadata = extractor().video(&tags).unwrap();
        assert_eq!(metadata.captured, datetime!(2023-06-02 09:00:00 +02:00));
        assert_eq!(metadata.timestamp_source.tag, "File:FileModifyDate");
        assert_eq!(metadata.model, None);
        assert_eq!(metadata.model_source, ModelSource::Missing);
    }

    #[test]
    fn test_video_embedded_candidate_rejects_naive_value() {
        let tags = TagMap::from_iter([("QuickTime:CreationDate", "2023:06:02 11:00:00")]);
        let err = extractor().video(&tags).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoTimestamp(tried) if tried.len() == 3));
    }

    #[test]
    fn test_video_model_tags() {
        let tags = TagMap::from_iter([
            ("File:FileModifyDate", "2023:06:02 09:00:00+02:00"),
            ("XML:DeviceManufacturer", "Sony"),
            ("XML:DeviceModelName", "ILCE-7M4"),
        ]);
        let metadata = extractor().video(&tags).unwrap();
        assert_eq!(metadata.make.as_deref(), Some("Sony"));
        assert_eq!(metadata.model.as_deref(), Some("ILCE-7M4"));
        assert_eq!(metadata.model_source, ModelSource::Tag("XML:DeviceModelName".to_string()));
    }

    #[test]
    fn test_custom_video_chain() {
        let tags = TagMap::from_iter([("Keys:CreationDate", "2024:02:29 12:00:00")]);
        let extractor = extractor().with_video_chain(vec![TimestampCandidate::new("Keys:CreationDate", Zone::Fallback)]);
        assert_eq!(extractor.video(&tags).unwrap().captured, datetime!(2024-02-29 12:00:00 +01:00));
    }
}
