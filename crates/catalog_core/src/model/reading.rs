//! Ordered lesson readings.

use super::{opt_id, opt_text, EntityId, FieldValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A link students read before or after a lesson.
///
/// Required attributes stay optional in memory so that a missing value is
/// reported by validation with the field name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub id: EntityId,
    pub lesson_id: Option<EntityId>,
    pub caption: Option<String>,
    pub url: Option<String>,
    /// Position within the lesson. Ties are allowed.
    pub order_number: Option<i64>,
    /// `Some(true)` puts the reading in the `pre` view; anything else is `post`.
    pub before_lesson: Option<bool>,
}

impl Reading {
    pub fn new(lesson_id: EntityId, order_number: i64, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id: Some(lesson_id),
            caption: None,
            url: Some(url.into()),
            order_number: Some(order_number),
            before_lesson: None,
        }
    }

    pub fn before_lesson(mut self, before: bool) -> Self {
        self.before_lesson = Some(before);
        self
    }

    /// Returns an unsaved copy carrying a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "lesson_id" => opt_id(self.lesson_id),
            "caption" => opt_text(self.caption.as_ref()),
            "url" => opt_text(self.url.as_ref()),
            "order_number" => self.order_number.map(FieldValue::Integer),
            "before_lesson" => self.before_lesson.map(FieldValue::Bool),
            _ => None,
        }
    }
}
