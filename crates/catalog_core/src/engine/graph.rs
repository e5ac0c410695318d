//! Association graph: static edges between entity kinds.
//!
//! # Responsibility
//! - Declare every parent -> child edge, its cardinality, how to traverse it
//!   and which delete policy (if any) applies.
//! - Resolve the ids reachable through one named edge.
//!
//! # Invariants
//! - Edges are addressed by `(parent, name)`; two edges between the same
//!   kinds stay independent.
//! - On a join edge the delete policy governs the join rows, never the
//!   far-side records.

use super::CatalogError;
use crate::model::{EntityId, EntityKind, FieldValue};
use crate::repo::entity_store::EntityStore;
use crate::repo::query::Condition;
use serde::{Deserialize, Serialize};

/// Shape of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// What deleting the parent does when the edge has dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Reject the delete.
    Restrict,
    /// Delete the dependents first.
    Cascade,
}

/// How to find the child rows of one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Child rows carry `column = parent.id`.
    ForeignKey { column: &'static str },
    /// Join rows carry `parent_column = parent.id`; `child_column` holds the
    /// far-side id. `filter` narrows the join rows to one role.
    Join {
        join: EntityKind,
        parent_column: &'static str,
        child_column: &'static str,
        filter: Option<(&'static str, &'static str)>,
    },
}

/// One named edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub name: &'static str,
    pub parent: EntityKind,
    pub child: EntityKind,
    pub cardinality: Cardinality,
    pub traversal: Traversal,
    /// `None` for query-only edges the deletion planner ignores.
    pub on_delete: Option<DeletePolicy>,
}

impl Association {
    pub fn has_many(
        name: &'static str,
        parent: EntityKind,
        child: EntityKind,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            parent,
            child,
            cardinality: Cardinality::OneToMany,
            traversal: Traversal::ForeignKey { column },
            on_delete: None,
        }
    }

    pub fn has_one(
        name: &'static str,
        parent: EntityKind,
        child: EntityKind,
        column: &'static str,
    ) -> Self {
        Self {
            cardinality: Cardinality::OneToOne,
            ..Self::has_many(name, parent, child, column)
        }
    }

    pub fn through(
        name: &'static str,
        parent: EntityKind,
        child: EntityKind,
        join: EntityKind,
        parent_column: &'static str,
        child_column: &'static str,
    ) -> Self {
        Self {
            name,
            parent,
            child,
            cardinality: Cardinality::ManyToMany,
            traversal: Traversal::Join {
                join,
                parent_column,
                child_column,
                filter: None,
            },
            on_delete: None,
        }
    }

    /// Restricts a join edge to join rows where `column = value`.
    pub fn where_join(mut self, column: &'static str, value: &'static str) -> Self {
        if let Traversal::Join { filter, .. } = &mut self.traversal {
            *filter = Some((column, value));
        }
        self
    }

    pub fn on_delete(mut self, policy: DeletePolicy) -> Self {
        self.on_delete = Some(policy);
        self
    }

    /// Kind of the rows a delete policy acts on: the child for direct edges,
    /// the join entity for join edges.
    pub fn dependent_kind(&self) -> EntityKind {
        match self.traversal {
            Traversal::ForeignKey { .. } => self.child,
            Traversal::Join { join, .. } => join,
        }
    }

    fn dependent_conditions(&self, parent_id: EntityId) -> Vec<Condition> {
        match self.traversal {
            Traversal::ForeignKey { column } => vec![Condition::eq(column, parent_id)],
            Traversal::Join {
                parent_column,
                filter,
                ..
            } => {
                let mut conditions = vec![Condition::eq(parent_column, parent_id)];
                if let Some((column, value)) = filter {
                    conditions.push(Condition::Is(column, Some(FieldValue::from(value))));
                }
                conditions
            }
        }
    }
}

/// The full static edge set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationGraph {
    edges: Vec<Association>,
}

impl AssociationGraph {
    /// Catalog edges with their delete policies.
    pub fn standard() -> Self {
        use DeletePolicy::{Cascade, Restrict};
        use EntityKind::*;

        let edges = vec![
            Association::has_many("terms", School, Term, "school_id").on_delete(Restrict),
            Association::has_many("courses", Term, Course, "term_id").on_delete(Restrict),
            Association::has_many("course_instructors", Course, CourseInstructor, "course_id")
                .on_delete(Restrict),
            Association::has_many("course_students", Course, CourseStudent, "course_id")
                .on_delete(Restrict),
            Association::has_many("lessons", Course, Lesson, "course_id").on_delete(Cascade),
            Association::has_many("assignments", Course, Assignment, "course_id")
                .on_delete(Cascade),
            Association::through(
                "instructors",
                Course,
                User,
                CourseInstructor,
                "course_id",
                "instructor_id",
            ),
            Association::through(
                "students",
                Course,
                User,
                CourseStudent,
                "course_id",
                "student_id",
            ),
            Association::has_many("readings", Lesson, Reading, "lesson_id").on_delete(Cascade),
            Association::through(
                "pre_class_assignments",
                Lesson,
                Assignment,
                LessonAssignment,
                "lesson_id",
                "assignment_id",
            )
            .where_join("role", "pre")
            .on_delete(Cascade),
            Association::through(
                "in_class_assignments",
                Lesson,
                Assignment,
                LessonAssignment,
                "lesson_id",
                "assignment_id",
            )
            .where_join("role", "in")
            .on_delete(Cascade),
            Association::has_one("grade", Assignment, AssignmentGrade, "assignment_id")
                .on_delete(Cascade),
            Association::through(
                "pre_class_lessons",
                Assignment,
                Lesson,
                LessonAssignment,
                "assignment_id",
                "lesson_id",
            )
            .where_join("role", "pre")
            .on_delete(Cascade),
            Association::through(
                "in_class_lessons",
                Assignment,
                Lesson,
                LessonAssignment,
                "assignment_id",
                "lesson_id",
            )
            .where_join("role", "in")
            .on_delete(Cascade),
            Association::has_many("instructor_memberships", User, CourseInstructor, "instructor_id")
                .on_delete(Restrict),
            Association::has_many("student_memberships", User, CourseStudent, "student_id")
                .on_delete(Restrict),
            Association::through(
                "taught_courses",
                User,
                Course,
                CourseInstructor,
                "instructor_id",
                "course_id",
            ),
            Association::through(
                "enrolled_courses",
                User,
                Course,
                CourseStudent,
                "student_id",
                "course_id",
            ),
        ];
        Self { edges }
    }

    pub fn new(edges: Vec<Association>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[Association] {
        &self.edges
    }

    /// Outgoing edges of `parent`, in declaration order.
    pub fn edges_from(&self, parent: EntityKind) -> impl Iterator<Item = &Association> {
        self.edges.iter().filter(move |edge| edge.parent == parent)
    }

    pub fn edge(&self, parent: EntityKind, name: &str) -> Option<&Association> {
        self.edges_from(parent).find(|edge| edge.name == name)
    }

    /// Replaces the delete policy of one edge.
    pub fn set_policy(
        &mut self,
        parent: EntityKind,
        name: &str,
        policy: Option<DeletePolicy>,
    ) -> Result<(), CatalogError> {
        let edge = self
            .edges
            .iter_mut()
            .find(|edge| edge.parent == parent && edge.name == name)
            .ok_or_else(|| CatalogError::UnknownRelation {
                kind: parent,
                relation: name.to_string(),
            })?;
        edge.on_delete = policy;
        Ok(())
    }

    /// Ids reachable from `parent_id` through the edge `relation`.
    ///
    /// Direct edges yield child ids; join edges yield far-side ids.
    pub fn dependents_of<S: EntityStore>(
        &self,
        store: &S,
        parent: EntityKind,
        parent_id: EntityId,
        relation: &str,
    ) -> Result<Vec<EntityId>, CatalogError> {
        let edge = self
            .edge(parent, relation)
            .ok_or_else(|| CatalogError::UnknownRelation {
                kind: parent,
                relation: relation.to_string(),
            })?;
        let conditions = edge.dependent_conditions(parent_id);
        let ids = match edge.traversal {
            Traversal::ForeignKey { .. } => store.column_ids(edge.child, "id", &conditions)?,
            Traversal::Join {
                join, child_column, ..
            } => store.column_ids(join, child_column, &conditions)?,
        };
        Ok(ids)
    }

    /// Ids of the rows a delete policy on `edge` acts on (see
    /// `Association::dependent_kind`).
    pub(crate) fn policy_targets<S: EntityStore>(
        &self,
        store: &S,
        edge: &Association,
        parent_id: EntityId,
    ) -> Result<Vec<EntityId>, CatalogError> {
        let conditions = edge.dependent_conditions(parent_id);
        Ok(store.column_ids(edge.dependent_kind(), "id", &conditions)?)
    }
}
