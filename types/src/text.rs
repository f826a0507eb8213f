//! Validated text types.
//!
//! These types enforce invariants at construction time. Once you hold a value,
//! you know it satisfies all required constraints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that is never empty (or whitespace-only) after trimming.
///
/// Used for identifiers and titles that the player shows or keys on. A record
/// carrying a blank title is malformed content, not a title to render as "".
///
/// # Serde
///
/// Serializes as a plain JSON string. Deserialization fails for blank input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("text must not be blank")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the trimmed text when it carries content.
///
/// Optional metadata is shown only when present; a blank string counts as absent.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank() {
        assert!(NonEmptyString::new("").is_err());
        assert!(NonEmptyString::new("  \n\t").is_err());
    }

    #[test]
    fn preserves_surrounding_whitespace() {
        let s = NonEmptyString::new("  breath  ").unwrap();
        assert_eq!(s.as_str(), "  breath  ");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<NonEmptyString, _> = serde_json::from_str("\"grounding\"");
        assert!(ok.is_ok());
        let blank: Result<NonEmptyString, _> = serde_json::from_str("\"   \"");
        assert!(blank.is_err());
    }

    #[test]
    fn present_treats_blank_as_absent() {
        assert_eq!(present(None), None);
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(Some(" polyvagal ")), Some("polyvagal"));
    }
}
