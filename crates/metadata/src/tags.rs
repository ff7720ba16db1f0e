use std::collections::HashMap;

/// Tags read from a single file, keyed by group-qualified name
/// (`EXIF:Model`, `QuickTime:CreationDate`).
///
/// Values are kept as text; numbers are rendered the way the metadata tool
/// printed them. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(HashMap<String, String>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.0.insert(tag.into(), value.into());
    }

    /// Trimmed value of `tag`, or `None` if it is absent or blank.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(|value| value.trim()).filter(|value| !value.is_empty())
    }

    /// The first of `tags` with a value, together with the tag that had it.
    ///
    /// # Example
    ///
    /// ```
    /// use camsync_metadata::TagMap;
    ///
    /// let tags = TagMap::from_iter([("XML:DeviceModelName", "ILCE-7M4")]);
    /// assert_eq!(
    ///     tags.first_of(&["QuickTime:Model", "XML:DeviceModelName"]),
    ///     Some(("XML:DeviceModelName", "ILCE-7M4")),
    /// );
    /// ```
    pub fn first_of<'t>(&self, tags: &[&'t str]) -> Option<(&'t str, &str)> {
        tags.iter().find_map(|tag| self.get(tag).map(|value| (*tag, value)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(tag, value)| (tag.into(), value.into())).collect())
    }
}
