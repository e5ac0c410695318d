//! Injected engine configuration.
//!
//! # Responsibility
//! - Bundle the rule tables and the association/policy graph handed to
//!   `CatalogService::new`.
//! - Apply deserialized delete-policy overrides on top of the standard graph.

use crate::engine::graph::{AssociationGraph, DeletePolicy};
use crate::engine::validation::RuleBook;
use crate::engine::CatalogResult;
use crate::model::EntityKind;
use serde::{Deserialize, Serialize};

/// Rule and policy tables for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub rules: RuleBook,
    pub graph: AssociationGraph,
}

impl CatalogConfig {
    pub fn standard() -> Self {
        Self {
            rules: RuleBook::standard(),
            graph: AssociationGraph::standard(),
        }
    }

    /// Applies overrides in order; later entries win.
    ///
    /// # Errors
    /// - `UnknownRelation` when an override names an edge that does not exist.
    pub fn with_overrides(mut self, overrides: &[PolicyOverride]) -> CatalogResult<Self> {
        for item in overrides {
            self.graph
                .set_policy(item.parent, &item.relation, item.policy)?;
        }
        Ok(self)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Serialized form of one delete-policy change, e.g.
/// `{"parent": "school", "relation": "terms", "policy": "cascade"}`.
///
/// A `null` or missing policy turns the edge into a query-only edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub parent: EntityKind,
    pub relation: String,
    #[serde(default)]
    pub policy: Option<DeletePolicy>,
}
