//! Shared types for wallsync

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("value cannot be empty")]
    Empty,
    #[error("invalid character in value: {0:?}")]
    InvalidCharacter(char),
    #[error("value cannot be a relative path component")]
    RelativeComponent,
}

/// A wallpaper category, i.e. one directory directly under `category/`.
///
/// Validation rules:
/// - Non-empty
/// - Not `.` or `..`
/// - No path separators (`/` or `\`)
/// - No NUL or control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Returns the category name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        if s == "." || s == ".." {
            return Err(ParseError::RelativeComponent);
        }

        for c in s.chars() {
            if c == '/' || c == '\\' || c.is_control() {
                return Err(ParseError::InvalidCharacter(c));
            }
        }

        Ok(CategoryName(s.to_string()))
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
