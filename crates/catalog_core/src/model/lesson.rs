//! Lessons and their pre-lesson / in-lesson assignment links.

use super::{opt_id, opt_text, text, EntityId, FieldValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: EntityId,
    pub course_id: Option<EntityId>,
    pub name: String,
    pub description: Option<String>,
}

impl Lesson {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: None,
            name: name.into(),
            description: None,
        }
    }

    pub fn in_course(mut self, course_id: EntityId) -> Self {
        self.course_id = Some(course_id);
        self
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "course_id" => opt_id(self.course_id),
            "name" => text(&self.name),
            "description" => opt_text(self.description.as_ref()),
            _ => None,
        }
    }
}

/// How an assignment relates to a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonRole {
    /// Work due before the lesson starts.
    Pre,
    /// Work handed out during the lesson.
    In,
}

impl LessonRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::In => "in",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pre" => Some(Self::Pre),
            "in" => Some(Self::In),
            _ => None,
        }
    }
}

/// Join record for the lesson/assignment many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonAssignment {
    pub id: EntityId,
    pub lesson_id: Option<EntityId>,
    pub assignment_id: Option<EntityId>,
    pub role: LessonRole,
}

impl LessonAssignment {
    pub fn new(lesson_id: EntityId, assignment_id: EntityId, role: LessonRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id: Some(lesson_id),
            assignment_id: Some(assignment_id),
            role,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "lesson_id" => opt_id(self.lesson_id),
            "assignment_id" => opt_id(self.assignment_id),
            "role" => text(self.role.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LessonRole;

    #[test]
    fn lesson_role_labels_parse_back() {
        for role in [LessonRole::Pre, LessonRole::In] {
            assert_eq!(LessonRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(LessonRole::parse("post"), None);
    }
}
