//! Deletion policy engine.
//!
//! Deleting is split in two: `plan_deletion` walks the association graph
//! and produces the complete ordered removal list without writing anything,
//! then `execute_plan` removes exactly that list. Callers run both inside
//! one store transaction.

use super::graph::{AssociationGraph, DeletePolicy};
use super::CatalogError;
use crate::model::{EntityId, EntityKind};
use crate::repo::entity_store::EntityStore;
use std::collections::HashSet;

/// Cascades deeper than this are treated as a configuration cycle.
pub const MAX_CASCADE_DEPTH: usize = 32;

/// Ordered removal list. Dependents always precede their parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    root: (EntityKind, EntityId),
    steps: Vec<(EntityKind, EntityId)>,
}

impl DeletionPlan {
    pub fn root(&self) -> (EntityKind, EntityId) {
        self.root
    }

    pub fn steps(&self) -> &[(EntityKind, EntityId)] {
        &self.steps
    }

    /// Number of records removed besides the root.
    pub fn cascaded(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// Computes the deletion set for one record.
///
/// # Errors
/// - `NotFound` when the root record does not exist.
/// - `DeletionRestricted` on the first restrict edge with dependents,
///   anywhere in the cascade.
/// - `CascadeTooDeep` when the walk exceeds `MAX_CASCADE_DEPTH`.
pub fn plan_deletion<S: EntityStore>(
    graph: &AssociationGraph,
    store: &S,
    kind: EntityKind,
    id: EntityId,
) -> Result<DeletionPlan, CatalogError> {
    if store.fetch(kind, id)?.is_none() {
        return Err(CatalogError::NotFound { kind, id });
    }

    let mut planner = Planner {
        graph,
        store,
        seen: HashSet::new(),
        steps: Vec::new(),
    };
    planner.visit(kind, id, 0)?;

    Ok(DeletionPlan {
        root: (kind, id),
        steps: planner.steps,
    })
}

/// Removes every planned record in order. Returns how many rows were removed.
pub fn execute_plan<S: EntityStore>(store: &S, plan: &DeletionPlan) -> Result<usize, CatalogError> {
    let mut removed = 0;
    for (kind, id) in plan.steps() {
        if store.remove(*kind, *id)? {
            removed += 1;
        }
    }
    Ok(removed)
}

struct Planner<'a, S> {
    graph: &'a AssociationGraph,
    store: &'a S,
    seen: HashSet<(EntityKind, EntityId)>,
    steps: Vec<(EntityKind, EntityId)>,
}

impl<S: EntityStore> Planner<'_, S> {
    fn visit(&mut self, kind: EntityKind, id: EntityId, depth: usize) -> Result<(), CatalogError> {
        if depth > MAX_CASCADE_DEPTH {
            return Err(CatalogError::CascadeTooDeep { depth });
        }
        if !self.seen.insert((kind, id)) {
            return Ok(());
        }

        let graph = self.graph;
        for edge in graph.edges_from(kind) {
            let Some(policy) = edge.on_delete else {
                continue;
            };
            let dependents = graph.policy_targets(self.store, edge, id)?;
            if dependents.is_empty() {
                continue;
            }

            match policy {
                DeletePolicy::Restrict => {
                    return Err(CatalogError::DeletionRestricted {
                        parent_kind: kind,
                        parent_id: id,
                        blocking_kind: edge.dependent_kind(),
                        relation: edge.name,
                    });
                }
                DeletePolicy::Cascade => {
                    let dependent_kind = edge.dependent_kind();
                    for dependent in dependents {
                        self.visit(dependent_kind, dependent, depth + 1)?;
                    }
                }
            }
        }

        self.steps.push((kind, id));
        Ok(())
    }
}
