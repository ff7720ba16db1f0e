use camsync_storage::Digest;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use time::OffsetDateTime;

/// Name a file is uploaded under:
/// `{YYYYMMDD}_{HHMMSS}_{model}_{original name}.{extension}`.
///
/// Names sort chronologically and never contain a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationName {
    stem: String,
    extension: String,
}

impl DestinationName {
    /// Build the name of a file captured at `captured`.
    ///
    /// The time is formatted in its own offset, exactly as the camera's
    /// clock showed it. The extension is lowercased.
    ///
    /// # Example
    ///
    /// ```
    /// use camsync_library::DestinationName;
    /// use time::macros::datetime;
    ///
    /// let name = DestinationName::derive(datetime!(2023-06-01 14:30:00 +01:00), "RX100", "IMG_0001", "JPG");
    /// assert_eq!(name.to_string(), "20230601_143000_RX100_IMG_0001.jpg");
    /// ```
    pub fn derive(captured: OffsetDateTime, model: &str, base: &str, extension: &str) -> Self {
        let stem = format!(
            "{:04}{:02}{:02}_{:02}{:02}{:02}_{}_{}",
            captured.year(),
            u8::from(captured.month()),
            captured.day(),
            captured.hour(),
            captured.minute(),
            captured.second(),
            strip_separators(model),
            strip_separators(base),
        );
        Self {
            stem,
            extension: strip_separators(&extension.to_lowercase()),
        }
    }

    /// The same name with a short content digest appended to the stem, for
    /// when the plain name is already taken by different content.
    pub fn disambiguate(&self, digest: &Digest) -> Self {
        self.with_suffix(digest.short())
    }

    fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            stem: format!("{}_{}", self.stem, suffix),
            extension: self.extension.clone(),
        }
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }
}

impl Display for DestinationName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.extension.is_empty() {
            f.write_str(&self.stem)
        } else {
            write!(f, "{}.{}", self.stem, self.extension)
        }
    }
}

fn strip_separators(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

/// Which destination names are taken, and by what content.
///
/// Seeded from the target's index and updated with every name handed out
/// during the run, so two different files that derive the same name (burst
/// shots within one second, two cards with the same numbering) never end up
/// overwriting or silently skipping each other.
#[derive(Debug, Default)]
pub(crate) struct NameLedger {
    claimed: HashMap<PathBuf, Digest>,
}

impl NameLedger {
    pub(crate) fn new(entries: impl IntoIterator<Item = (PathBuf, Digest)>) -> Self {
        Self {
            claimed: entries.into_iter().collect(),
        }
    }

    /// Claim `name` for content `digest`, returning the name to upload under.
    ///
    /// A name already held by the same content is returned as-is: the copy
    /// will be a no-op at the target.
    pub(crate) fn claim(&mut self, name: DestinationName, digest: &Digest) -> DestinationName {
        let candidates = [name.with_suffix(digest.short()), name.with_suffix(digest.as_str())];
        let mut candidate = name;
        for next in candidates {
            let path = candidate.to_path_buf();
            match self.claimed.get(&path) {
                None => {
                    self.claimed.insert(path, digest.clone());
                    return candidate;
                },
                Some(holder) if holder == digest => return candidate,
                Some(_) => {
                    tracing::info!(name = %candidate, "Name already taken by different content; adding digest");
                    candidate = next;
                },
            }
        }
        // The full digest can only be taken by a file someone named after
        // this exact content.
        self.claimed.insert(candidate.to_path_buf(), digest.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsync_storage::{HashType, hash_bytes};
    use time::macros::datetime;

    #[test]
    fn test_derive() {
        let name = DestinationName::derive(datetime!(2023-06-02 09:00:00 +02:00), "RX100", "CLIP0001", "MP4");
        assert_eq!(name.to_string(), "20230602_090000_RX100_CLIP0001.mp4");
        assert_eq!(name.to_path_buf(), PathBuf::from("20230602_090000_RX100_CLIP0001.mp4"));
    }

    #[test]
    fn test_derive_keeps_wall_clock() {
        let captured = datetime!(2023-12-31 23:30:00 -05:00);
        let name = DestinationName::derive(captured, "X100V", "DSCF0001", "raf");
        // Not converted to UTC, which would already be next year.
        assert_eq!(name.to_string(), "20231231_233000_X100V_DSCF0001.raf");
    }

    #[test]
    fn test_derive_is_deterministic_and_flat() {
        let captured = datetime!(2023-06-01 14:30:00 UTC);
        let a = DestinationName::derive(captured, "Pixel/7", "IMG\\0001", "JPG");
        let b = DestinationName::derive(captured, "Pixel/7", "IMG\\0001", "JPG");
        assert_eq!(a, b);
        assert!(!a.to_string().contains(['/', '\\']));
    }

    #[test]
    fn test_ledger() {
        let captured = datetime!(2023-06-01 14:30:00 UTC);
        let name = DestinationName::derive(captured, "RX100", "IMG_0001", "JPG");
        let old = hash_bytes(HashType::Md5, b"photo from another card");
        let new = hash_bytes(HashType::Md5, b"photo");
        let mut ledger = NameLedger::new([(name.to_path_buf(), old.clone())]);

        let claimed = ledger.claim(name.clone(), &new);
        assert_eq!(claimed.to_string(), format!("20230601_143000_RX100_IMG_0001_{}.jpg", new.short()));
        // Claiming again with the same content yields the same name.
        assert_eq!(ledger.claim(name.clone(), &new), claimed);
        // The original holder keeps its name.
        assert_eq!(ledger.claim(name.clone(), &old), name);
    }

    #[test]
    fn test_ledger_free_names() {
        let mut ledger = NameLedger::default();
        let digest = hash_bytes(HashType::Md5, b"photo");
        let name = DestinationName::derive(datetime!(2023-06-01 14:30:00 UTC), "RX100", "IMG_0001", "JPG");
        assert_eq!(ledger.claim(name.clone(), &digest), name);
        let other = hash_bytes(HashType::Md5, b"burst shot");
        assert_ne!(ledger.claim(name.clone(), &other), name);
    }
}
