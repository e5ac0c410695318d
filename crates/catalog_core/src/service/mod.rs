//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the rule engine and the entity store into per-request
//!   operations.
//! - Keep callers decoupled from storage details.

pub mod catalog_service;
