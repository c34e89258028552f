//! Caption classification.
//!
//! A caption is mapped to exactly one [`Category`] by its first recognised
//! hashtag, and may carry a recording timestamp in `DD-MM-YYYY_HH-MM-SS` form.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

// ASCII classes only: `#aggression_teacherфото` still yields `aggression_teacher`.
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9A-Za-z_]+)").expect("Invalid hashtag regex"));

static RECORDED_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{2}-[0-9]{2}-[0-9]{4}_[0-9]{2}-[0-9]{2}-[0-9]{2}")
        .expect("Invalid timestamp regex")
});

/// Event category assigned to a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    AggressionBetweenChildren,
    AggressionTeacher,
    ChildrenUnattended,
    #[default]
    SuddenEvent,
}

impl Category {
    /// Name of the category as the backend expects it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AggressionBetweenChildren => "AGGRESSION_BETWEEN_CHILDREN",
            Self::AggressionTeacher => "AGGRESSION_TEACHER",
            Self::ChildrenUnattended => "CHILDREN_UNATTENDED",
            Self::SuddenEvent => "SUDDEN_EVENT",
        }
    }

    /// Look up a hashtag (lowercase, without `#`).
    #[must_use]
    pub fn from_hashtag(tag: &str) -> Option<Self> {
        match tag {
            "aggression_children" | "aggressionchildren" => Some(Self::AggressionBetweenChildren),
            "aggression_teacher" | "aggressionteacher" => Some(Self::AggressionTeacher),
            "children_unattended" | "childrenunattended" => Some(Self::ChildrenUnattended),
            "sudden_event" | "suddenevent" => Some(Self::SuddenEvent),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one caption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub category: Category,
    /// Recording timestamp exactly as written in the caption.
    pub recorded_at: Option<String>,
}

/// Classify a caption.
///
/// Never fails: a missing caption, a caption without a known hashtag, and a
/// caption without a timestamp all produce valid results.
#[must_use]
pub fn classify(caption: Option<&str>) -> Classification {
    let Some(caption) = caption else {
        return Classification::default();
    };

    let category = HASHTAG_RE
        .captures_iter(caption)
        .find_map(|caps| Category::from_hashtag(&caps[1].to_lowercase()))
        .unwrap_or_default();

    let recorded_at = RECORDED_AT_RE
        .find(caption)
        .map(|m| m.as_str().to_string());

    Classification {
        category,
        recorded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_caption() {
        let result = classify(None);
        assert_eq!(result.category, Category::SuddenEvent);
        assert_eq!(result.recorded_at, None);
    }

    #[test]
    fn test_hashtag_case_insensitive() {
        for caption in [
            "#aggression_teacher",
            "#AGGRESSION_TEACHER",
            "look at this #Aggression_Teacher",
            "#AggressionTeacher",
        ] {
            assert_eq!(
                classify(Some(caption)).category,
                Category::AggressionTeacher,
                "caption: {caption}"
            );
        }
    }

    #[test]
    fn test_first_matching_hashtag_wins() {
        let result = classify(Some("#aggression_teacher #children_unattended"));
        assert_eq!(result.category, Category::AggressionTeacher);

        let result = classify(Some("#childrenunattended then #aggression_teacher"));
        assert_eq!(result.category, Category::ChildrenUnattended);
    }

    #[test]
    fn test_unknown_hashtags_are_skipped() {
        let result = classify(Some("#kindergarten #room3 #aggression_children"));
        assert_eq!(result.category, Category::AggressionBetweenChildren);
    }

    #[test]
    fn test_hashtag_stops_at_non_ascii() {
        assert_eq!(
            classify(Some("#aggression_teacherвидео")).category,
            Category::AggressionTeacher
        );
    }

    #[test]
    fn test_no_recognised_hashtag_defaults() {
        assert_eq!(
            classify(Some("#kindergarten nothing here")).category,
            Category::SuddenEvent
        );
        assert_eq!(classify(Some("")).category, Category::SuddenEvent);
    }

    #[test]
    fn test_timestamp_with_sudden_event() {
        let result = classify(Some("incident #sudden_event 07-07-2025_12-12-12"));
        assert_eq!(
            result,
            Classification {
                category: Category::SuddenEvent,
                recorded_at: Some("07-07-2025_12-12-12".to_string()),
            }
        );
    }

    #[test]
    fn test_timestamp_without_hashtag() {
        let result = classify(Some("recorded 31-12-2024_23-59-59, camera 2"));
        assert_eq!(result.category, Category::SuddenEvent);
        assert_eq!(result.recorded_at.as_deref(), Some("31-12-2024_23-59-59"));
    }

    #[test]
    fn test_first_timestamp_wins_and_is_not_validated() {
        let result = classify(Some("99-99-9999_99-99-99 and 01-01-2025_00-00-00"));
        assert_eq!(result.recorded_at.as_deref(), Some("99-99-9999_99-99-99"));
    }

    #[test]
    fn test_partial_timestamp_is_ignored() {
        assert_eq!(classify(Some("07-07-2025 12:12:12")).recorded_at, None);
        assert_eq!(classify(Some("7-7-2025_12-12-12")).recorded_at, None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let caption = Some("#children_unattended 01-02-2025_03-04-05 #aggression_teacher");
        assert_eq!(classify(caption), classify(caption));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(
            Category::AggressionBetweenChildren.to_string(),
            "AGGRESSION_BETWEEN_CHILDREN"
        );
        assert_eq!(Category::default().as_str(), "SUDDEN_EVENT");
    }
}
