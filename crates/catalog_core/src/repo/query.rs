//! Storage-neutral predicate and ordering types.

use crate::model::FieldValue;

/// One predicate clause. Clauses in a slice are AND-ed.
///
/// Both comparisons are null-safe: `Is(col, None)` matches null columns and
/// `IsNot(col, Some(true))` matches nulls as well as `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Is(&'static str, Option<FieldValue>),
    IsNot(&'static str, Option<FieldValue>),
}

impl Condition {
    pub fn eq(column: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Is(column, Some(value.into()))
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Is(column, _) | Self::IsNot(column, _) => column,
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

impl SortKey {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}
