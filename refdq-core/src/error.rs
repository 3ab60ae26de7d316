// refdq-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefdqError {
    // --- DOMAIN (configuration, templates, session ordering) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (backend, IO, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for RefdqError {
    fn from(err: std::io::Error) -> Self {
        RefdqError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for RefdqError {
    fn from(err: duckdb::Error) -> Self {
        RefdqError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(err)))
    }
}

impl RefdqError {
    /// True when the relational backend rejected or failed a statement.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            RefdqError::Infrastructure(InfrastructureError::Database(_))
        )
    }
}
