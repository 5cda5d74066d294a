//! Free-text input that must carry actual content.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input held nothing but whitespace
    #[error("text must contain at least one non-whitespace character")]
    Blank,
}

/// Trimmed free text with at least one non-whitespace character.
///
/// Used where the backend rejects blank submissions (suggestion content,
/// display names) so the rejection happens before a request is built.
/// Validation runs on deserialisation too: a blank string in a response
/// body is a decode error, not an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and validates that something remains.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Blank` when the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        Self::new(&input)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  melhorar a agenda  ").expect("valid text");
        assert_eq!(text.as_str(), "melhorar a agenda");
    }

    #[test]
    fn rejects_whitespace_only_input() {
        assert!(matches!(NonEmptyText::new(" \t\n"), Err(TextError::Blank)));
    }

    #[test]
    fn serialises_as_a_plain_string() {
        let text = NonEmptyText::new("hello").expect("valid text");
        assert_eq!(
            serde_json::to_string(&text).expect("serialise"),
            "\"hello\""
        );
    }

    #[test]
    fn blank_input_fails_deserialisation() {
        assert!(serde_json::from_str::<NonEmptyText>("\"  \"").is_err());
    }

    #[test]
    fn round_trips_through_serde() {
        let text = NonEmptyText::new("valid content").expect("valid text");
        let json = serde_json::to_string(&text).expect("serialise");
        let back: NonEmptyText = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, text);
    }
}
