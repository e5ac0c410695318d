//! Catalog rule engine: validation, association graph, deletion policy and
//! default views.
//!
//! # Responsibility
//! - Enforce the rules the entity store does not: scoped uniqueness, format
//!   checks, restrict/cascade deletes and default ordering.
//! - Report every outcome through `CatalogError`.
//!
//! # Invariants
//! - A rejected write or delete leaves the store exactly as it was.
//! - Rule and policy tables come from an injected `CatalogConfig`, never
//!   from process-global state.

pub mod deletion;
pub mod graph;
pub mod ordering;
pub mod validation;

use crate::model::{EntityId, EntityKind};
use crate::repo::entity_store::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use validation::{RuleKind, Violation};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Expected, recoverable outcomes of catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Every violated rule of a rejected write.
    Validation(Vec<Violation>),
    /// Delete blocked by a restrict edge with existing dependents.
    DeletionRestricted {
        parent_kind: EntityKind,
        parent_id: EntityId,
        blocking_kind: EntityKind,
        relation: &'static str,
    },
    NotFound {
        kind: EntityKind,
        id: EntityId,
    },
    /// No edge with this name leaves `kind`.
    UnknownRelation {
        kind: EntityKind,
        relation: String,
    },
    CascadeTooDeep {
        depth: usize,
    },
    Repo(RepoError),
}

impl CatalogError {
    /// Violations carried by a `Validation` error; empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(violations) => {
                let details = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation failed: {details}")
            }
            Self::DeletionRestricted {
                parent_kind,
                parent_id,
                blocking_kind,
                relation,
            } => write!(
                f,
                "cannot delete {parent_kind} {parent_id}: dependent {blocking_kind} records exist via `{relation}`"
            ),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UnknownRelation { kind, relation } => {
                write!(f, "{kind} has no relation `{relation}`")
            }
            Self::CascadeTooDeep { depth } => {
                write!(f, "cascade exceeded maximum depth at level {depth}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            // A backing unique index firing at commit is the same outcome as
            // the uniqueness rule failing.
            RepoError::UniqueViolation { column, .. } => {
                Self::Validation(vec![Violation::new(column, RuleKind::Uniqueness)])
            }
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}
