//! Camera model clean-up.
//!
//! Cameras are inconsistent about what they write into the model tag: Sony
//! writes `DSC-RX100`, Canon writes `Canon EOS R6` (make included), some
//! phones include a slash. The model ends up in file names, so it is reduced
//! to something short and filesystem-safe.

/// Placeholder model when nothing better is known.
pub const UNKNOWN_MODEL: &str = "UNKNOWN";

/// Substring replacement applied to camera models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub pattern: String,
    pub replacement: String,
}
impl RenameRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Ordered model clean-up rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRules {
    /// Remove the manufacturer name from the model.
    pub trim_make: bool,
    /// Tried in order; only the first rule whose pattern occurs is applied.
    pub rename: Vec<RenameRule>,
}
impl Default for ModelRules {
    fn default() -> Self {
        Self {
            trim_make: true,
            rename: vec![RenameRule::new("DSC-", "")],
        }
    }
}

impl ModelRules {
    /// Normalize a model for use in a file name.
    ///
    /// 1. With [`trim_make`](Self::trim_make), every occurrence of `make` is
    ///    removed and surrounding whitespace is trimmed. A model that is only
    ///    the make ends up empty.
    /// 2. The first [`RenameRule`] whose pattern occurs has all its
    ///    occurrences replaced, verbatim.
    /// 3. Path separators become `_`.
    ///
    /// # Example
    ///
    /// ```
    /// use camsync_library::ModelRules;
    ///
    /// let rules = ModelRules::default();
    /// assert_eq!(rules.normalize("SONY DSC-RX100", Some("SONY")), "RX100");
    /// ```
    pub fn normalize(&self, model: &str, make: Option<&str>) -> String {
        let mut normalized = model.to_string();
        if self.trim_make
            && let Some(make) = make.filter(|make| !make.is_empty())
        {
            normalized = normalized.replace(make, "").trim().to_string();
        }
        if let Some(rule) = self.rename.iter().find(|rule| !rule.pattern.is_empty() && normalized.contains(&rule.pattern)) {
            normalized = normalized.replace(&rule.pattern, &rule.replacement);
        }
        normalized.replace(['/', '\\'], "_")
    }
}

/// The camera model of the most recent still image, used for videos that
/// don't record one.
///
/// Cards usually come out of a single camera, and video containers often
/// lack the model tag that every still image has. Written during the stills
/// pass only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedModel(String);

impl Default for RetainedModel {
    fn default() -> Self {
        Self(UNKNOWN_MODEL.to_string())
    }
}

impl RetainedModel {
    pub fn get(&self) -> &str {
        &self.0
    }

    pub(crate) fn retain(&mut self, model: impl Into<String>) {
        self.0 = model.into();
    }

    /// `true` until a still image provided a model.
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SONY DSC-RX100", Some("SONY"), "RX100")]
    #[case("DSC-RX100M7", Some("SONY"), "RX100M7")]
    #[case("Canon EOS R6", Some("Canon"), "EOS R6")]
    #[case("ILCE-7M4", Some("SONY"), "ILCE-7M4")]
    #[case(" E-M10MarkIII ", Some("OLYMPUS CORPORATION"), "E-M10MarkIII")]
    #[case("GoPro", Some("GoPro"), "")]
    #[case("DC-G9", None, "DC-G9")]
    #[case("DC-G9", Some(""), "DC-G9")]
    #[case("Pixel 7/Pro", Some("Google"), "Pixel 7_Pro")]
    #[case("A\\B", None, "A_B")]
    fn test_normalize_defaults(#[case] model: &str, #[case] make: Option<&str>, #[case] expected: &str) {
        assert_eq!(ModelRules::default().normalize(model, make), expected);
    }

    #[test]
    fn test_make_trimming_can_be_disabled() {
        let rules = ModelRules {
            trim_make: false,
            rename: vec![],
        };
        assert_eq!(rules.normalize("Canon EOS R6", Some("Canon")), "Canon EOS R6");
    }

    #[test]
    fn test_make_trimming_is_case_sensitive() {
        let rules = ModelRules {
            trim_make: true,
            rename: vec![],
        };
        assert_eq!(rules.normalize("Sony ZV-1", Some("SONY")), "Sony ZV-1");
    }

    #[test]
    fn test_only_first_matching_rule_applies() {
        let rules = ModelRules {
            trim_make: false,
            rename: vec![
                RenameRule::new("Nope", "x"),
                RenameRule::new("DSC-", ""),
                RenameRule::new("RX", "Cyber-shot "),
            ],
        };
        assert_eq!(rules.normalize("DSC-RX100", None), "RX100");
    }

    #[test]
    fn test_whitespace_only_trimmed_with_make() {
        let untrimmed = ModelRules {
            trim_make: false,
            rename: vec![],
        };
        assert_eq!(untrimmed.normalize(" E-M10 ", Some("OLYMPUS")), " E-M10 ");
        let rules = ModelRules {
            trim_make: true,
            rename: vec![RenameRule::new("X", " A ")],
        };
        // The replacement is kept as configured, padding included.
        assert_eq!(rules.normalize("X1", None), " A 1");
        assert_eq!(rules.normalize("SONY X1", Some("SONY")), " A 1");
    }

    #[test]
    fn test_rule_replaces_every_occurrence() {
        let rules = ModelRules {
            trim_make: false,
            rename: vec![RenameRule::new("-", "")],
        };
        assert_eq!(rules.normalize("DC-GH5-II", None), "DCGH5II");
    }

    #[rstest]
    #[case("SONY DSC-RX100", Some("SONY"))]
    #[case("Canon EOS R6", Some("Canon"))]
    #[case("Pixel 7/Pro", Some("Google"))]
    #[case("ILCE-7M4", None)]
    fn test_normalize_is_idempotent(#[case] model: &str, #[case] make: Option<&str>) {
        let rules = ModelRules::default();
        let once = rules.normalize(model, make);
        assert_eq!(rules.normalize(&once, make), once);
    }

    #[test]
    fn test_retained_model() {
        let mut retained = RetainedModel::default();
        assert!(retained.is_unknown());
        assert_eq!(retained.get(), "UNKNOWN");
        retained.retain("RX100");
        assert!(!retained.is_unknown());
        assert_eq!(retained.get(), "RX100");
    }
}
