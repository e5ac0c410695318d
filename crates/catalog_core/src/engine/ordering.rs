//! Default sort orders and named views.
//!
//! These are query-time decorations only; nothing here is stored.

use crate::model::{EntityId, EntityKind, FieldValue};
use crate::repo::query::{Condition, SortKey};

const SCHOOL_ORDER: &[SortKey] = &[SortKey::asc("name")];
const TERM_ORDER: &[SortKey] = &[SortKey::desc("ends_on")];
const READING_ORDER: &[SortKey] = &[SortKey::asc("order_number")];

/// Sort applied when a listing does not specify one. The store appends
/// `id ASC` as a final tie-breaker.
pub fn default_order(kind: EntityKind) -> &'static [SortKey] {
    match kind {
        EntityKind::School => SCHOOL_ORDER,
        EntityKind::Term => TERM_ORDER,
        EntityKind::Reading => READING_ORDER,
        _ => &[],
    }
}

/// Named subsets of a lesson's readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadingView {
    #[default]
    All,
    /// `before_lesson = true`.
    Pre,
    /// `before_lesson` is false or null.
    Post,
}

impl ReadingView {
    pub fn conditions(self) -> Vec<Condition> {
        let before = Some(FieldValue::Bool(true));
        match self {
            Self::All => Vec::new(),
            Self::Pre => vec![Condition::Is("before_lesson", before)],
            Self::Post => vec![Condition::IsNot("before_lesson", before)],
        }
    }
}

/// Terms owned by one school.
pub fn for_school_id(school_id: EntityId) -> Condition {
    Condition::eq("school_id", school_id)
}
