//! Assignments and their grade records.

use super::{opt_id, text, EntityId, FieldValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: EntityId,
    /// Required; also the scope of `name` uniqueness.
    pub course_id: Option<EntityId>,
    pub name: String,
    pub percent_of_grade: Option<f64>,
}

impl Assignment {
    pub fn new(course_id: EntityId, name: impl Into<String>, percent_of_grade: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: Some(course_id),
            name: name.into(),
            percent_of_grade: Some(percent_of_grade),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "course_id" => opt_id(self.course_id),
            "name" => text(&self.name),
            "percent_of_grade" => self.percent_of_grade.map(FieldValue::Real),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentGrade {
    pub id: EntityId,
    pub assignment_id: Option<EntityId>,
    pub final_grade: Option<f64>,
}

impl AssignmentGrade {
    pub fn new(assignment_id: EntityId, final_grade: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            assignment_id: Some(assignment_id),
            final_grade: Some(final_grade),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "assignment_id" => opt_id(self.assignment_id),
            "final_grade" => self.final_grade.map(FieldValue::Real),
            _ => None,
        }
    }
}
