// refdq-core/src/infrastructure/adapters/mod.rs

pub mod csv;
pub mod duckdb;
