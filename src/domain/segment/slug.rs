//! SegmentSlug value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Human-readable unique name of a segment, e.g. `AVITO_VOICE_MESSAGES`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentSlug(String);

impl SegmentSlug {
    /// Maximum slug length in characters.
    pub const MAX_LEN: usize = 128;

    /// Creates a slug, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the slug is blank
    /// - `InvalidFormat` if it is too long or contains inner whitespace
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("slug"));
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::invalid_format(
                "slug",
                format!("must be at most {} characters", Self::MAX_LEN),
            ));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "slug",
                "must not contain whitespace",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parses a list of raw slugs, failing on the first invalid one.
    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values.into_iter().map(Self::new).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SegmentSlug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentSlug> for String {
    fn from(slug: SegmentSlug) -> Self {
        slug.0
    }
}

impl AsRef<str> for SegmentSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_trims_surrounding_whitespace() {
        let slug = SegmentSlug::new("  AVITO_DISCOUNT_30 ").unwrap();
        assert_eq!(slug.as_str(), "AVITO_DISCOUNT_30");
    }

    #[test]
    fn slug_rejects_blank_values() {
        assert!(matches!(
            SegmentSlug::new("   "),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn slug_rejects_inner_whitespace() {
        assert!(SegmentSlug::new("two words").is_err());
    }

    #[test]
    fn slug_rejects_overlong_values() {
        let long = "a".repeat(SegmentSlug::MAX_LEN + 1);
        assert!(SegmentSlug::new(long).is_err());
        assert!(SegmentSlug::new("a".repeat(SegmentSlug::MAX_LEN)).is_ok());
    }

    #[test]
    fn parse_all_fails_on_any_invalid_slug() {
        assert_eq!(SegmentSlug::parse_all(["a", "b"]).unwrap().len(), 2);
        assert!(SegmentSlug::parse_all(["a", ""]).is_err());
    }

    #[test]
    fn slug_deserializes_with_validation() {
        let slug: SegmentSlug = serde_json::from_str("\"beta\"").unwrap();
        assert_eq!(slug.as_str(), "beta");
        assert!(serde_json::from_str::<SegmentSlug>("\"\"").is_err());
    }
}
