//! Catalog use-case service.
//!
//! # Responsibility
//! - Expose create/update/delete/get/list for every entity kind.
//! - Run validate-then-write and plan-then-delete inside one store
//!   transaction per call.
//! - Offer typed helpers for the catalog's common traversals.
//!
//! # Invariants
//! - No write reaches the store unless validation returned no violations.
//! - A failed call rolls back everything it wrote.
//! - Logs carry kinds, ids and counts only, never field values.

use crate::config::CatalogConfig;
use crate::engine::deletion::{execute_plan, plan_deletion};
use crate::engine::ordering::{default_order, for_school_id, ReadingView};
use crate::engine::validation::Validator;
use crate::engine::{CatalogError, CatalogResult};
use crate::model::{
    Assignment, CourseMembership, CourseRole, EntityId, EntityKind, LessonAssignment, LessonRole,
    Reading, Record, School, Term, User,
};
use crate::repo::entity_store::EntityStore;
use crate::repo::query::{Condition, SortKey};
use log::{info, warn};
use std::time::Instant;

/// Filter and ordering for `CatalogService::list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: Vec<Condition>,
    /// `None` applies the kind's default order.
    pub order: Option<Vec<SortKey>>,
}

impl ListQuery {
    pub fn filtered(filter: Vec<Condition>) -> Self {
        Self {
            filter,
            order: None,
        }
    }
}

/// Outcome of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionReport {
    /// Rows removed, the root included.
    pub removed: usize,
}

/// Rule-enforcing facade over an entity store.
pub struct CatalogService<S: EntityStore> {
    store: S,
    config: CatalogConfig,
}

impl<S: EntityStore> CatalogService<S> {
    pub fn new(store: S, config: CatalogConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Validates and inserts a new record. Returns its id.
    pub fn create(&self, record: impl Into<Record>) -> CatalogResult<EntityId> {
        self.create_under(&[], record.into())
    }

    /// Validates and overwrites an existing record.
    ///
    /// # Errors
    /// - `NotFound` when no record of the same kind has this id.
    pub fn update(&self, record: impl Into<Record>) -> CatalogResult<()> {
        let record = record.into();
        let started_at = Instant::now();
        let result: CatalogResult<()> = self.store.within_transaction(|store| {
            let (kind, id) = (record.kind(), record.id());
            if store.fetch(kind, id)?.is_none() {
                return Err(CatalogError::NotFound { kind, id });
            }
            self.ensure_valid(store, &record)?;
            if !store.update_fields(&record)? {
                return Err(CatalogError::NotFound { kind, id });
            }
            Ok(())
        });
        log_write("entity_update", &record, started_at, &result);
        result
    }

    /// Deletes a record, applying restrict/cascade edges atomically.
    pub fn delete(&self, kind: EntityKind, id: EntityId) -> CatalogResult<DeletionReport> {
        let started_at = Instant::now();
        let result: CatalogResult<DeletionReport> = self.store.within_transaction(|store| {
            let plan = plan_deletion(&self.config.graph, store, kind, id)?;
            let removed = execute_plan(store, &plan)?;
            Ok(DeletionReport { removed })
        });

        match &result {
            Ok(report) => info!(
                "event=entity_delete module=service status=ok kind={kind} id={id} removed={} duration_ms={}",
                report.removed,
                started_at.elapsed().as_millis()
            ),
            Err(CatalogError::DeletionRestricted {
                blocking_kind,
                relation,
                ..
            }) => warn!(
                "event=entity_delete module=service status=rejected kind={kind} id={id} error_code=deletion_restricted blocking_kind={blocking_kind} relation={relation}"
            ),
            Err(err) => warn!(
                "event=entity_delete module=service status=error kind={kind} id={id} error_code={}",
                error_code(err)
            ),
        }
        result
    }

    /// Loads one record.
    pub fn get(&self, kind: EntityKind, id: EntityId) -> CatalogResult<Record> {
        self.store
            .fetch(kind, id)?
            .ok_or(CatalogError::NotFound { kind, id })
    }

    /// Lists records of one kind.
    pub fn list(&self, kind: EntityKind, query: &ListQuery) -> CatalogResult<Vec<Record>> {
        let order = query
            .order
            .as_deref()
            .unwrap_or_else(|| default_order(kind));
        Ok(self.store.query(kind, &query.filter, order)?)
    }

    /// Ids reachable from one record through a named association.
    pub fn dependents_of(
        &self,
        kind: EntityKind,
        id: EntityId,
        relation: &str,
    ) -> CatalogResult<Vec<EntityId>> {
        self.config
            .graph
            .dependents_of(&self.store, kind, id, relation)
    }

    /// Attaches `term` to an existing school and saves it.
    pub fn add_term(&self, school_id: EntityId, mut term: Term) -> CatalogResult<EntityId> {
        term.school_id = Some(school_id);
        self.create_under(&[(EntityKind::School, school_id)], term.into())
    }

    /// Terms of one school, latest end date first.
    pub fn terms_for_school(&self, school_id: EntityId) -> CatalogResult<Vec<Term>> {
        let records = self.list(
            EntityKind::Term,
            &ListQuery::filtered(vec![for_school_id(school_id)]),
        )?;
        Ok(typed(records))
    }

    /// Name of the term's school, or `"None"`.
    pub fn school_name(&self, term: &Term) -> CatalogResult<String> {
        let school = match term.school_id {
            Some(school_id) => self
                .store
                .fetch(EntityKind::School, school_id)?
                .and_then(|record| School::try_from(record).ok()),
            None => None,
        };
        Ok(term.school_name(school.as_ref()))
    }

    /// Readings of one lesson in `order_number` order, narrowed by `view`.
    pub fn readings_for_lesson(
        &self,
        lesson_id: EntityId,
        view: ReadingView,
    ) -> CatalogResult<Vec<Reading>> {
        let mut filter = vec![Condition::eq("lesson_id", lesson_id)];
        filter.extend(view.conditions());
        let records = self.list(EntityKind::Reading, &ListQuery::filtered(filter))?;
        Ok(typed(records))
    }

    /// Links an assignment to a lesson in the given role.
    pub fn link_assignment(
        &self,
        lesson_id: EntityId,
        assignment_id: EntityId,
        role: LessonRole,
    ) -> CatalogResult<EntityId> {
        self.create_under(
            &[
                (EntityKind::Lesson, lesson_id),
                (EntityKind::Assignment, assignment_id),
            ],
            LessonAssignment::new(lesson_id, assignment_id, role).into(),
        )
    }

    /// Assignments linked to a lesson in one role.
    pub fn lesson_assignments(
        &self,
        lesson_id: EntityId,
        role: LessonRole,
    ) -> CatalogResult<Vec<Assignment>> {
        let relation = match role {
            LessonRole::Pre => "pre_class_assignments",
            LessonRole::In => "in_class_assignments",
        };
        let ids = self.dependents_of(EntityKind::Lesson, lesson_id, relation)?;
        self.load_all(EntityKind::Assignment, ids)
    }

    /// Adds a user to a course as instructor or student.
    pub fn add_course_member(
        &self,
        course_id: EntityId,
        user_id: EntityId,
        role: CourseRole,
    ) -> CatalogResult<EntityId> {
        self.create_under(
            &[(EntityKind::Course, course_id), (EntityKind::User, user_id)],
            CourseMembership::new(course_id, user_id, role).into(),
        )
    }

    /// Users attached to a course in one role.
    pub fn course_members(
        &self,
        course_id: EntityId,
        role: CourseRole,
    ) -> CatalogResult<Vec<User>> {
        let relation = match role {
            CourseRole::Instructor => "instructors",
            CourseRole::Student => "students",
        };
        let ids = self.dependents_of(EntityKind::Course, course_id, relation)?;
        self.load_all(EntityKind::User, ids)
    }

    /// Inserts `record` once every `(kind, id)` in `parents` exists. The
    /// parent checks, validation and insert share one transaction.
    fn create_under(
        &self,
        parents: &[(EntityKind, EntityId)],
        record: Record,
    ) -> CatalogResult<EntityId> {
        let started_at = Instant::now();
        let result: CatalogResult<EntityId> = self.store.within_transaction(|store| {
            for &(kind, id) in parents {
                if store.fetch(kind, id)?.is_none() {
                    return Err(CatalogError::NotFound { kind, id });
                }
            }
            self.ensure_valid(store, &record)?;
            store.insert(&record)?;
            Ok(record.id())
        });
        log_write("entity_create", &record, started_at, &result);
        result
    }

    fn ensure_valid(&self, store: &S, record: &Record) -> CatalogResult<()> {
        let violations = Validator::new(&self.config.rules).validate(store, record)?;
        if violations.is_empty() {
            return Ok(());
        }
        Err(CatalogError::Validation(violations))
    }

    /// Loads ids in order, skipping ids whose record is gone.
    fn load_all<T: TryFrom<Record>>(
        &self,
        kind: EntityKind,
        ids: Vec<EntityId>,
    ) -> CatalogResult<Vec<T>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.store.fetch(kind, id)? {
                records.push(record);
            }
        }
        Ok(typed(records))
    }
}

fn typed<T: TryFrom<Record>>(records: Vec<Record>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| T::try_from(record).ok())
        .collect()
}

fn log_write<T>(event: &str, record: &Record, started_at: Instant, result: &CatalogResult<T>) {
    let kind = record.kind();
    let id = record.id();
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok kind={kind} id={id} duration_ms={duration_ms}"
        ),
        Err(CatalogError::Validation(violations)) => warn!(
            "event={event} module=service status=rejected kind={kind} id={id} duration_ms={duration_ms} error_code=validation_failed violations={}",
            violations.len()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error kind={kind} id={id} duration_ms={duration_ms} error_code={}",
            error_code(err)
        ),
    }
}

fn error_code(err: &CatalogError) -> &'static str {
    match err {
        CatalogError::Validation(_) => "validation_failed",
        CatalogError::DeletionRestricted { .. } => "deletion_restricted",
        CatalogError::NotFound { .. } => "not_found",
        CatalogError::UnknownRelation { .. } => "unknown_relation",
        CatalogError::CascadeTooDeep { .. } => "cascade_too_deep",
        CatalogError::Repo(_) => "storage_failed",
    }
}
