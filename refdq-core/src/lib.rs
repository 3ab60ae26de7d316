// refdq-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: contracts towards the relational backend.
pub mod ports;

// 2. Domain: targets, check registry, templates, schema reconciliation, session states.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: DuckDB, YAML configuration, CSV ingestion, Jinja statements.
pub mod infrastructure;

// 4. Application: the validation stages and the session orchestrator.
pub mod application;

pub mod error;

#[cfg(test)]
pub(crate) mod test_support;

// --- RE-EXPORTS ---
pub use error::RefdqError;
