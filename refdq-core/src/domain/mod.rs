// refdq-core/src/domain/mod.rs

pub mod compiler;
pub mod error;
pub mod impact;
pub mod ports;
pub mod project;
pub mod row;
pub mod schema;
pub mod session;
pub mod target;
pub mod upload;

pub use error::DomainError;
