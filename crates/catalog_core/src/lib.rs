//! Core rule engine for the course catalog.
//! This crate is the single source of truth for catalog integrity rules:
//! validation, scoped uniqueness, restrict/cascade deletes and default views.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, PolicyOverride};
pub use engine::deletion::{execute_plan, plan_deletion, DeletionPlan};
pub use engine::graph::{Association, AssociationGraph, Cardinality, DeletePolicy, Traversal};
pub use engine::ordering::{default_order, ReadingView};
pub use engine::validation::{Pattern, Rule, RuleBook, RuleKind, Validator, Violation};
pub use engine::{CatalogError, CatalogResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::{
    Assignment, AssignmentGrade, Course, CourseMembership, CourseRole, EntityId, EntityKind,
    FieldValue, Lesson, LessonAssignment, LessonRole, Reading, Record, School, Term, User,
};
pub use repo::entity_store::{EntityStore, RepoError, RepoResult, SqliteEntityStore};
pub use repo::query::{Condition, SortKey};
pub use service::catalog_service::{CatalogService, DeletionReport, ListQuery};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
