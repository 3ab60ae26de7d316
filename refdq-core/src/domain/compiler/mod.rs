// refdq-core/src/domain/compiler/mod.rs

pub mod quoter;
pub mod template;

pub use template::{RenderedQuery, SqlTemplate, VariableScope};
