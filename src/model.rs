//! Catalog data types shared by the remote and fallback paths.

use serde::{Deserialize, Serialize};

/// Sentinel category meaning "no category constraint".
pub const ALL_CATEGORIES: &str = "ALL";

/// User-entered search criteria.
///
/// Always run through [`FilterCriteria::normalized`] before being applied to
/// either remote query parameters or the local fallback predicate, so both
/// paths compute the same result for the same input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub keyword: String,
    pub category: String,
}

impl FilterCriteria {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }

    /// Trim both fields and case-fold the keyword. The `ALL` sentinel is
    /// collapsed to an empty category so downstream code has a single
    /// "unconstrained" representation.
    pub fn normalized(&self) -> Self {
        let category = self.category.trim();
        let category = if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
            String::new()
        } else {
            category.to_lowercase()
        };
        Self {
            keyword: self.keyword.trim().to_lowercase(),
            category,
        }
    }
}

/// One catalog entry as listed by `GET /books`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookSummary {
    #[serde(rename = "bookId")]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "coverUrl", default)]
    pub cover_url: Option<String>,
}

/// Full record as returned by `GET /books/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub summary: BookSummary,
    #[serde(default)]
    pub description: String,
}

/// Draft submitted through `POST /books`.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    /// An accepted AI suggestion, stored alongside the book when present.
    pub ai_summary: Option<String>,
}

/// Identifier handed back after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedBook {
    #[serde(rename = "bookId")]
    pub book_id: String,
}

/// The exact form-field values a suggestion was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSnapshot {
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
}

/// AI-generated descriptive text plus the snapshot that produced it, kept
/// for staleness checks at the consuming boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub source_fields: FieldSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_and_case_folds() {
        let criteria = FilterCriteria::new("  Clean Code ", " Programming ");
        let normalized = criteria.normalized();
        assert_eq!(normalized.keyword, "clean code");
        assert_eq!(normalized.category, "programming");
    }

    #[test]
    fn all_sentinel_collapses_to_empty_category() {
        assert_eq!(FilterCriteria::new("kim", "ALL").normalized().category, "");
        assert_eq!(FilterCriteria::new("kim", "all").normalized().category, "");
        assert_eq!(FilterCriteria::new("kim", " All ").normalized().category, "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = FilterCriteria::new(" Kim ", "ALL").normalized();
        assert_eq!(once.normalized(), once);
    }
}
