use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("text is empty after sanitization")]
    Empty,
    #[error("text exceeds {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Free text that has been stripped of HTML tags, trimmed, and length-checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CleanText(String);

impl CleanText {
    /// Sanitizes `raw` and enforces a character limit.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing remains after sanitization and
    /// [`TextError::TooLong`] if the cleaned text exceeds `max_chars`.
    pub fn parse(raw: impl Into<String>, max_chars: usize) -> Result<Self, TextError> {
        let cleaned = sanitize(&raw.into());
        if cleaned.is_empty() {
            return Err(TextError::Empty);
        }
        let len = cleaned.chars().count();
        if len > max_chars {
            return Err(TextError::TooLong {
                len,
                max: max_chars,
            });
        }
        Ok(Self(cleaned))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Removes `<...>` tag spans and trims surrounding whitespace.
///
/// Only complete spans are removed; an unterminated `<` stays literal, so
/// plain text such as `a < b` survives.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_tags() {
        assert_eq!(sanitize("hello <b>world</b>"), "hello world");
    }

    #[test]
    fn test_sanitize_strips_script_tags() {
        assert_eq!(sanitize("<script>alert(1)</script>safe"), "alert(1)safe");
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(sanitize("  padded  "), "padded");
    }

    #[test]
    fn test_sanitize_keeps_unterminated_angle_bracket() {
        assert_eq!(sanitize("a < b"), "a < b");
        assert_eq!(sanitize("tail<open"), "tail<open");
    }

    #[test]
    fn test_sanitize_handles_nested_angle_brackets() {
        assert_eq!(sanitize("<a<b>x"), "x");
    }

    #[test]
    fn test_parse_rejects_tag_only_input() {
        let result = CleanText::parse("<br>", 100);
        assert_eq!(result, Err(TextError::Empty));
    }

    #[test]
    fn test_parse_rejects_over_limit() {
        let result = CleanText::parse("abcdef", 5);
        assert_eq!(result, Err(TextError::TooLong { len: 6, max: 5 }));
    }

    #[test]
    fn test_parse_counts_chars_not_bytes() {
        // Five Arabic letters are more than five bytes but still within limit.
        let result = CleanText::parse("مرحبا", 5);
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_keeps_interior_whitespace() {
        let text = CleanText::parse("  keep  inner  spacing  ", 100).unwrap();
        assert_eq!(text.as_str(), "keep  inner  spacing");
    }
}
