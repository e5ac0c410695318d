//! Schools and the terms they own.

use super::{opt_id, text, EntityId, FieldValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label returned by `Term::school_name` when no school is attached.
pub const NO_SCHOOL_NAME: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: EntityId,
    pub name: String,
}

impl School {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => text(&self.name),
            _ => None,
        }
    }
}

/// Academic term. Dates are optional in memory so a missing date surfaces as
/// a validation failure rather than a constructor panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: EntityId,
    /// Owning school. May point at a school that no longer exists.
    pub school_id: Option<EntityId>,
    pub name: String,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl Term {
    /// Creates an unscheduled term with no school.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            school_id: None,
            name: name.into(),
            starts_on: None,
            ends_on: None,
        }
    }

    pub fn scheduled(name: impl Into<String>, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self {
            starts_on: Some(starts_on),
            ends_on: Some(ends_on),
            ..Self::new(name)
        }
    }

    pub fn in_school(mut self, school_id: EntityId) -> Self {
        self.school_id = Some(school_id);
        self
    }

    /// Display name of the owning school, or `"None"` when it is unset or gone.
    pub fn school_name(&self, school: Option<&School>) -> String {
        match (self.school_id, school) {
            (Some(id), Some(school)) if school.id == id => school.name.clone(),
            _ => NO_SCHOOL_NAME.to_string(),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "school_id" => opt_id(self.school_id),
            "name" => text(&self.name),
            "starts_on" => self.starts_on.map(FieldValue::Date),
            "ends_on" => self.ends_on.map(FieldValue::Date),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_name_falls_back_when_school_is_missing() {
        let school = School::new("Ridgemont High");
        let orphan = Term::new("Fall Semester");
        assert_eq!(orphan.school_name(None), "None");

        let owned = Term::new("Fall Semester").in_school(school.id);
        assert_eq!(owned.school_name(Some(&school)), "Ridgemont High");
        assert_eq!(owned.school_name(None), "None");
    }

    #[test]
    fn school_name_ignores_a_different_school() {
        let school = School::new("Ridgemont High");
        let other = School::new("Shermer High");
        let term = Term::new("Spring").in_school(school.id);
        assert_eq!(term.school_name(Some(&other)), "None");
    }
}
