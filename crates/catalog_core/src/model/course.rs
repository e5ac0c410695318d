//! Courses and their instructor/student memberships.

use super::{opt_id, text, EntityId, EntityKind, FieldValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: EntityId,
    /// Scope of `course_code` uniqueness. `None` is its own scope.
    pub term_id: Option<EntityId>,
    pub name: String,
    /// Three letters followed by three digits, e.g. `ALS400`.
    pub course_code: String,
}

impl Course {
    pub fn new(name: impl Into<String>, course_code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            term_id: None,
            name: name.into(),
            course_code: course_code.into(),
        }
    }

    pub fn in_term(mut self, term_id: EntityId) -> Self {
        self.term_id = Some(term_id);
        self
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "term_id" => opt_id(self.term_id),
            "name" => text(&self.name),
            "course_code" => text(&self.course_code),
            _ => None,
        }
    }
}

/// Role discriminator for course membership rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseRole {
    Instructor,
    Student,
}

impl CourseRole {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Instructor => EntityKind::CourseInstructor,
            Self::Student => EntityKind::CourseStudent,
        }
    }

    /// Column holding the user id in the role's table.
    pub fn user_column(self) -> &'static str {
        match self {
            Self::Instructor => "instructor_id",
            Self::Student => "student_id",
        }
    }

    pub fn from_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::CourseInstructor => Some(Self::Instructor),
            EntityKind::CourseStudent => Some(Self::Student),
            _ => None,
        }
    }
}

/// Join record between a course and a user (`CourseInstructor` or
/// `CourseStudent`, depending on `role`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMembership {
    pub id: EntityId,
    pub course_id: Option<EntityId>,
    pub user_id: Option<EntityId>,
    pub role: CourseRole,
}

impl CourseMembership {
    pub fn new(course_id: EntityId, user_id: EntityId, role: CourseRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: Some(course_id),
            user_id: Some(user_id),
            role,
        }
    }

    pub fn instructor(course_id: EntityId, user_id: EntityId) -> Self {
        Self::new(course_id, user_id, CourseRole::Instructor)
    }

    pub fn student(course_id: EntityId, user_id: EntityId) -> Self {
        Self::new(course_id, user_id, CourseRole::Student)
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "course_id" => opt_id(self.course_id),
            "user_id" => opt_id(self.user_id),
            column if column == self.role.user_column() => opt_id(self.user_id),
            _ => None,
        }
    }
}
