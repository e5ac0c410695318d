//! Catalog domain model.
//!
//! # Responsibility
//! - Define one struct per catalog entity plus the closed `EntityKind` tag set.
//! - Expose every entity through the tagged `Record` enum so validation,
//!   storage and deletion planning dispatch with a plain `match`.
//!
//! # Invariants
//! - Every record is identified by a stable `EntityId` that is never reused.
//! - Field names used by `Record::field` equal the backing column names.

pub mod assignment;
pub mod course;
pub mod lesson;
pub mod reading;
pub mod school;
pub mod user;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use assignment::{Assignment, AssignmentGrade};
pub use course::{Course, CourseMembership, CourseRole};
pub use lesson::{Lesson, LessonAssignment, LessonRole};
pub use reading::Reading;
pub use school::{School, Term};
pub use user::User;

/// Stable identifier shared by every catalog entity.
pub type EntityId = Uuid;

/// Closed set of catalog entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    School,
    Term,
    Course,
    CourseInstructor,
    CourseStudent,
    Lesson,
    Reading,
    Assignment,
    AssignmentGrade,
    LessonAssignment,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        Self::School,
        Self::Term,
        Self::Course,
        Self::CourseInstructor,
        Self::CourseStudent,
        Self::Lesson,
        Self::Reading,
        Self::Assignment,
        Self::AssignmentGrade,
        Self::LessonAssignment,
        Self::User,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::School => "schools",
            Self::Term => "terms",
            Self::Course => "courses",
            Self::CourseInstructor => "course_instructors",
            Self::CourseStudent => "course_students",
            Self::Lesson => "lessons",
            Self::Reading => "readings",
            Self::Assignment => "assignments",
            Self::AssignmentGrade => "assignment_grades",
            Self::LessonAssignment => "lesson_assignments",
            Self::User => "users",
        }
    }

    /// Persisted columns, `id` first.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::School => &["id", "name"],
            Self::Term => &["id", "school_id", "name", "starts_on", "ends_on"],
            Self::Course => &["id", "term_id", "name", "course_code"],
            Self::CourseInstructor => &["id", "course_id", "instructor_id"],
            Self::CourseStudent => &["id", "course_id", "student_id"],
            Self::Lesson => &["id", "course_id", "name", "description"],
            Self::Reading => &[
                "id",
                "lesson_id",
                "caption",
                "url",
                "order_number",
                "before_lesson",
            ],
            Self::Assignment => &["id", "course_id", "name", "percent_of_grade"],
            Self::AssignmentGrade => &["id", "assignment_id", "final_grade"],
            Self::LessonAssignment => &["id", "lesson_id", "assignment_id", "role"],
            Self::User => &["id", "first_name", "last_name", "email", "photo_url"],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Stable snake_case label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Term => "term",
            Self::Course => "course",
            Self::CourseInstructor => "course_instructor",
            Self::CourseStudent => "course_student",
            Self::Lesson => "lesson",
            Self::Reading => "reading",
            Self::Assignment => "assignment",
            Self::AssignmentGrade => "assignment_grade",
            Self::LessonAssignment => "lesson_assignment",
            Self::User => "user",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-null attribute value. A null attribute is `None` at call sites.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Id(EntityId),
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Blank means an all-whitespace string. Non-text values are never blank.
    pub fn is_blank(&self) -> bool {
        self.as_text().is_some_and(|value| value.trim().is_empty())
    }

    pub fn is_finite_number(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Real(value) => value.is_finite(),
            _ => false,
        }
    }
}

impl From<EntityId> for FieldValue {
    fn from(value: EntityId) -> Self {
        Self::Id(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Tagged union over every catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    School(School),
    Term(Term),
    Course(Course),
    /// Instructor or student link; the role picks the entity kind.
    Membership(CourseMembership),
    Lesson(Lesson),
    Reading(Reading),
    Assignment(Assignment),
    AssignmentGrade(AssignmentGrade),
    LessonAssignment(LessonAssignment),
    User(User),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::School(_) => EntityKind::School,
            Self::Term(_) => EntityKind::Term,
            Self::Course(_) => EntityKind::Course,
            Self::Membership(member) => member.role.kind(),
            Self::Lesson(_) => EntityKind::Lesson,
            Self::Reading(_) => EntityKind::Reading,
            Self::Assignment(_) => EntityKind::Assignment,
            Self::AssignmentGrade(_) => EntityKind::AssignmentGrade,
            Self::LessonAssignment(_) => EntityKind::LessonAssignment,
            Self::User(_) => EntityKind::User,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Self::School(value) => value.id,
            Self::Term(value) => value.id,
            Self::Course(value) => value.id,
            Self::Membership(value) => value.id,
            Self::Lesson(value) => value.id,
            Self::Reading(value) => value.id,
            Self::Assignment(value) => value.id,
            Self::AssignmentGrade(value) => value.id,
            Self::LessonAssignment(value) => value.id,
            Self::User(value) => value.id,
        }
    }

    /// Reads one attribute by column name. Unknown names and nulls are `None`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            Self::School(value) => value.field(name),
            Self::Term(value) => value.field(name),
            Self::Course(value) => value.field(name),
            Self::Membership(value) => value.field(name),
            Self::Lesson(value) => value.field(name),
            Self::Reading(value) => value.field(name),
            Self::Assignment(value) => value.field(name),
            Self::AssignmentGrade(value) => value.field(name),
            Self::LessonAssignment(value) => value.field(name),
            Self::User(value) => value.field(name),
        }
    }
}

macro_rules! impl_record_conversions {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl TryFrom<Record> for $ty {
                type Error = Record;

                fn try_from(value: Record) -> Result<Self, Record> {
                    match value {
                        Record::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_record_conversions!(
    School => School,
    Term => Term,
    Course => Course,
    CourseMembership => Membership,
    Lesson => Lesson,
    Reading => Reading,
    Assignment => Assignment,
    AssignmentGrade => AssignmentGrade,
    LessonAssignment => LessonAssignment,
    User => User,
);

pub(crate) fn text(value: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(value.to_string()))
}

pub(crate) fn opt_text(value: Option<&String>) -> Option<FieldValue> {
    value.map(|value| FieldValue::Text(value.clone()))
}

pub(crate) fn opt_id(value: Option<EntityId>) -> Option<FieldValue> {
    value.map(FieldValue::Id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_lists_id_as_first_column() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.columns()[0], "id", "{kind}");
        }
    }

    #[test]
    fn blank_only_applies_to_text() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from("x").is_blank());
        assert!(!FieldValue::from(0_i64).is_blank());
    }

    #[test]
    fn membership_kind_follows_role() {
        let course_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let instructor = Record::from(CourseMembership::instructor(course_id, user_id));
        let student = Record::from(CourseMembership::student(course_id, user_id));
        assert_eq!(instructor.kind(), EntityKind::CourseInstructor);
        assert_eq!(student.kind(), EntityKind::CourseStudent);
        assert_eq!(instructor.field("instructor_id"), Some(FieldValue::Id(user_id)));
        assert_eq!(student.field("student_id"), Some(FieldValue::Id(user_id)));
    }

    #[test]
    fn non_finite_reals_are_not_numbers() {
        assert!(FieldValue::Real(12.5).is_finite_number());
        assert!(!FieldValue::Real(f64::NAN).is_finite_number());
        assert!(!FieldValue::from("12").is_finite_number());
    }
}
