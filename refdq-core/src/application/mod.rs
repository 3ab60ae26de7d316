// refdq-core/src/application/mod.rs

pub mod action;
pub mod catalog;
pub mod checks;
pub mod engine;
pub mod impact;
pub mod ports;
pub mod session;
pub mod staging;
pub mod type_check;
pub mod write;

// --- RE-EXPORTS ---
// `use refdq_core::application::{load_catalog, ValidationSession};`

pub use catalog::{Catalog, load_catalog, target_sample};
pub use engine::execute_query;
pub use session::{SessionContext, ValidationSession};
