//! Memory record model used by the store.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the store; never reused after deletion.
pub type MemoryId = i64;

/// Display and filter tag for a memory. Not part of scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    Decision,
    Preference,
    Lesson,
    #[default]
    Fact,
    Context,
}

impl MemoryCategory {
    /// All categories in declaration order.
    pub const ALL: [MemoryCategory; 5] = [
        MemoryCategory::Decision,
        MemoryCategory::Preference,
        MemoryCategory::Lesson,
        MemoryCategory::Fact,
        MemoryCategory::Context,
    ];

    /// Lowercase name as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryCategory::Decision => "decision",
            MemoryCategory::Preference => "preference",
            MemoryCategory::Lesson => "lesson",
            MemoryCategory::Fact => "fact",
            MemoryCategory::Context => "context",
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = MemoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        MemoryCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| MemoryError::InvalidCategory(value.to_string()))
    }
}

/// Persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Record identifier.
    pub id: MemoryId,
    /// Record content.
    pub content: String,
    /// Record category.
    pub category: MemoryCategory,
    /// False when the record was written without a vector (keyword-only).
    pub embedded: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp; equal to `created_at` for every record today.
    pub updated_at: DateTime<Utc>,
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    /// Combined hybrid score.
    pub score: f32,
    /// Clamped cosine similarity in `[0, 1]`.
    pub vector_score: f32,
    /// Batch-normalized keyword score in `[0, 1]`.
    pub keyword_score: f32,
}

#[cfg(test)]
mod tests {
    use super::MemoryCategory;
    use crate::MemoryError;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            "Preference".parse::<MemoryCategory>().expect("parse"),
            MemoryCategory::Preference
        );
        assert_eq!(
            " lesson ".parse::<MemoryCategory>().expect("parse"),
            MemoryCategory::Lesson
        );
    }

    #[test]
    fn category_rejects_unknown_names() {
        let err = "opinion".parse::<MemoryCategory>().unwrap_err();
        assert!(matches!(err, MemoryError::InvalidCategory(name) if name == "opinion"));
    }

    #[test]
    fn category_defaults_to_fact() {
        assert_eq!(MemoryCategory::default(), MemoryCategory::Fact);
        assert_eq!(MemoryCategory::default().to_string(), "fact");
    }
}
