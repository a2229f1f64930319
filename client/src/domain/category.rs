//! Expense categories scoped to one family.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{CategoryId, FamilyId, NAME_MAX};

/// Category record returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Validation errors for category input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong { max: usize },
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "category name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "category name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}

/// Validated category name: trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryName(String);

impl CategoryName {
    /// Validate and construct a category name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CategoryValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(CategoryValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
