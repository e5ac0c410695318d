//! Entity store abstraction and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage primitives the rule engine consumes.
//! - Isolate SQL details from the engine and service layers.
//!
//! # Invariants
//! - The store performs no validation; writes arrive pre-validated.
//! - Semantic failures (unique index, unknown column) are distinct
//!   `RepoError` variants, not raw SQLite errors.

pub mod entity_store;
pub mod query;
