//! Raw query input

use std::fmt;

use serde::Serialize;

use crate::error::AppError;

/// The exact text the user typed, bounded in length.
///
/// Length is counted in characters, and the bound is checked before any
/// recognition work is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawQuery(String);

impl RawQuery {
    pub fn new(text: impl Into<String>, max_length: usize) -> Result<Self, AppError> {
        let text = text.into();
        let length = text.chars().count();
        if length > max_length {
            return Err(AppError::QueryTooLong {
                length,
                max: max_length,
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RawQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
