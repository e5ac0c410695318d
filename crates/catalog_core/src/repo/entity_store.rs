//! Entity store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD, predicate queries and a transaction boundary for
//!   every `EntityKind`.
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - The store never validates; callers run the rule engine first.
//! - Column names in predicates and sort keys are checked against
//!   `EntityKind::columns` before they reach SQL text.
//! - Read paths reject undecodable persisted rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::{
    Assignment, AssignmentGrade, Course, CourseMembership, CourseRole, EntityId, EntityKind,
    FieldValue, Lesson, LessonAssignment, LessonRole, Reading, Record, School, Term, User,
};
use crate::repo::query::{Condition, SortKey};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for entity store operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A backing unique index rejected the write.
    UniqueViolation { kind: EntityKind, column: String },
    /// Predicate or sort key named a column the entity does not have.
    UnknownColumn { kind: EntityKind, column: String },
    /// Connection is not migrated to the version this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation { kind, column } => {
                write!(f, "unique index rejected {kind}.{column}")
            }
            Self::UnknownColumn { kind, column } => {
                write!(f, "{kind} has no column `{column}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entity store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage primitives the rule engine builds on.
pub trait EntityStore {
    /// Inserts a new row for `record`.
    fn insert(&self, record: &Record) -> RepoResult<()>;
    /// Loads one record by id.
    fn fetch(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Record>>;
    /// Overwrites every non-id column. Returns `false` when no row matched.
    fn update_fields(&self, record: &Record) -> RepoResult<bool>;
    /// Deletes one row. Returns `false` when no row matched.
    fn remove(&self, kind: EntityKind, id: EntityId) -> RepoResult<bool>;
    /// Loads all records matching every condition, in the given order.
    fn query(
        &self,
        kind: EntityKind,
        conditions: &[Condition],
        order: &[SortKey],
    ) -> RepoResult<Vec<Record>>;
    /// Returns the non-null ids stored in `column` of matching rows.
    fn column_ids(
        &self,
        kind: EntityKind,
        column: &'static str,
        conditions: &[Condition],
    ) -> RepoResult<Vec<EntityId>>;
    /// Returns whether at least one row matches.
    fn exists(&self, kind: EntityKind, conditions: &[Condition]) -> RepoResult<bool>;
    /// Runs `work` atomically: committed on `Ok`, rolled back on `Err`.
    ///
    /// Calls nested inside an open transaction join it.
    fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>;
}

/// SQLite-backed entity store over a migrated connection.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn insert(&self, record: &Record) -> RepoResult<()> {
        let kind = record.kind();
        let columns = kind.columns();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            kind.table(),
            columns.join(", ")
        );
        let values = columns.iter().map(|column| to_sql(record.field(column)));

        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| map_write_error(kind, err))?;
        Ok(())
    }

    fn fetch(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Record>> {
        let mut records = self.query(kind, &[Condition::eq("id", id)], &[])?;
        Ok(records.pop())
    }

    fn update_fields(&self, record: &Record) -> RepoResult<bool> {
        let kind = record.kind();
        let columns = &kind.columns()[1..];
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ?{};",
            kind.table(),
            columns.len() + 1
        );
        let mut values: Vec<Value> = columns
            .iter()
            .map(|column| to_sql(record.field(column)))
            .collect();
        values.push(Value::Text(record.id().to_string()));

        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| map_write_error(kind, err))?;
        Ok(changed > 0)
    }

    fn remove(&self, kind: EntityKind, id: EntityId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", kind.table()),
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn query(
        &self,
        kind: EntityKind,
        conditions: &[Condition],
        order: &[SortKey],
    ) -> RepoResult<Vec<Record>> {
        let mut binds = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            kind.columns().join(", "),
            kind.table()
        );
        sql.push_str(&where_clause(kind, conditions, &mut binds)?);
        sql.push_str(&order_clause(kind, order)?);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record(kind, row)?);
        }
        Ok(records)
    }

    fn column_ids(
        &self,
        kind: EntityKind,
        column: &'static str,
        conditions: &[Condition],
    ) -> RepoResult<Vec<EntityId>> {
        ensure_column(kind, column)?;
        let mut binds = Vec::new();
        let mut sql = format!("SELECT {column} FROM {}", kind.table());
        sql.push_str(&where_clause(kind, conditions, &mut binds)?);
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(text) = row.get::<_, Option<String>>(0)? {
                ids.push(parse_uuid(&text, kind, column)?);
            }
        }
        Ok(ids)
    }

    fn exists(&self, kind: EntityKind, conditions: &[Condition]) -> RepoResult<bool> {
        let mut binds = Vec::new();
        let filter = where_clause(kind, conditions, &mut binds)?;
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {}{filter});", kind.table());
        let found: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        Ok(found == 1)
    }

    fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        if !self.conn.is_autocommit() {
            return work(self);
        }

        // IMMEDIATE takes the write lock up front, so reads made while
        // validating cannot be invalidated by another writer before commit.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(RepoError::from(err)))?;
        let outcome = work(self)?;
        tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
        Ok(outcome)
    }
}

fn ensure_column(kind: EntityKind, column: &str) -> RepoResult<()> {
    if kind.has_column(column) {
        return Ok(());
    }
    Err(RepoError::UnknownColumn {
        kind,
        column: column.to_string(),
    })
}

fn where_clause(
    kind: EntityKind,
    conditions: &[Condition],
    binds: &mut Vec<Value>,
) -> RepoResult<String> {
    let mut clauses = Vec::with_capacity(conditions.len());
    for condition in conditions {
        ensure_column(kind, condition.column())?;
        let (column, operator, value) = match condition {
            Condition::Is(column, value) => (column, "IS", value),
            Condition::IsNot(column, value) => (column, "IS NOT", value),
        };
        binds.push(to_sql(value.clone()));
        clauses.push(format!("{column} {operator} ?{}", binds.len()));
    }

    if clauses.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" WHERE {}", clauses.join(" AND ")))
}

fn order_clause(kind: EntityKind, order: &[SortKey]) -> RepoResult<String> {
    let mut terms = Vec::with_capacity(order.len() + 1);
    for key in order {
        ensure_column(kind, key.column)?;
        let direction = if key.descending { "DESC" } else { "ASC" };
        terms.push(format!("{} {direction}", key.column));
    }
    if !order.iter().any(|key| key.column == "id") {
        terms.push("id ASC".to_string());
    }
    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

fn to_sql(value: Option<FieldValue>) -> Value {
    match value {
        None => Value::Null,
        Some(FieldValue::Id(id)) => Value::Text(id.to_string()),
        Some(FieldValue::Text(text)) => Value::Text(text),
        Some(FieldValue::Integer(number)) => Value::Integer(number),
        Some(FieldValue::Real(number)) => Value::Real(number),
        Some(FieldValue::Bool(flag)) => Value::Integer(i64::from(flag)),
        Some(FieldValue::Date(date)) => Value::Text(date.format("%Y-%m-%d").to_string()),
    }
}

fn map_write_error(kind: EntityKind, err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            // Message shape: "UNIQUE constraint failed: courses.term_id, courses.course_code".
            let column = message.rsplit('.').next().unwrap_or_default().trim();
            return RepoError::UniqueViolation {
                kind,
                column: column.to_string(),
            };
        }
    }
    err.into()
}

fn parse_record(kind: EntityKind, row: &Row<'_>) -> RepoResult<Record> {
    let id = required_uuid(row, kind, "id")?;
    let record = match kind {
        EntityKind::School => Record::School(School {
            id,
            name: row.get("name")?,
        }),
        EntityKind::Term => Record::Term(Term {
            id,
            school_id: optional_uuid(row, kind, "school_id")?,
            name: row.get("name")?,
            starts_on: row.get::<_, Option<NaiveDate>>("starts_on")?,
            ends_on: row.get::<_, Option<NaiveDate>>("ends_on")?,
        }),
        EntityKind::Course => Record::Course(Course {
            id,
            term_id: optional_uuid(row, kind, "term_id")?,
            name: row.get("name")?,
            course_code: row.get("course_code")?,
        }),
        EntityKind::CourseInstructor | EntityKind::CourseStudent => {
            let role = CourseRole::from_kind(kind).ok_or_else(|| {
                RepoError::InvalidData(format!("{kind} is not a membership kind"))
            })?;
            Record::Membership(CourseMembership {
                id,
                course_id: optional_uuid(row, kind, "course_id")?,
                user_id: optional_uuid(row, kind, role.user_column())?,
                role,
            })
        }
        EntityKind::Lesson => Record::Lesson(Lesson {
            id,
            course_id: optional_uuid(row, kind, "course_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
        }),
        EntityKind::Reading => Record::Reading(Reading {
            id,
            lesson_id: optional_uuid(row, kind, "lesson_id")?,
            caption: row.get("caption")?,
            url: row.get("url")?,
            order_number: row.get("order_number")?,
            before_lesson: row.get("before_lesson")?,
        }),
        EntityKind::Assignment => Record::Assignment(Assignment {
            id,
            course_id: optional_uuid(row, kind, "course_id")?,
            name: row.get("name")?,
            percent_of_grade: row.get("percent_of_grade")?,
        }),
        EntityKind::AssignmentGrade => Record::AssignmentGrade(AssignmentGrade {
            id,
            assignment_id: optional_uuid(row, kind, "assignment_id")?,
            final_grade: row.get("final_grade")?,
        }),
        EntityKind::LessonAssignment => {
            let role_text: String = row.get("role")?;
            let role = LessonRole::parse(&role_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid role `{role_text}` in lesson_assignments.role"
                ))
            })?;
            Record::LessonAssignment(LessonAssignment {
                id,
                lesson_id: optional_uuid(row, kind, "lesson_id")?,
                assignment_id: optional_uuid(row, kind, "assignment_id")?,
                role,
            })
        }
        EntityKind::User => Record::User(User {
            id,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            photo_url: row.get("photo_url")?,
        }),
    };
    Ok(record)
}

fn required_uuid(row: &Row<'_>, kind: EntityKind, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    parse_uuid(&text, kind, column)
}

fn optional_uuid(row: &Row<'_>, kind: EntityKind, column: &str) -> RepoResult<Option<Uuid>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| parse_uuid(&text, kind, column))
        .transpose()
}

fn parse_uuid(value: &str, kind: EntityKind, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid `{value}` in {}.{column}",
            kind.table()
        ))
    })
}
