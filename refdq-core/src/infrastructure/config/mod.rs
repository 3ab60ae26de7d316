// refdq-core/src/infrastructure/config/mod.rs

pub mod catalog;
pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use catalog::YamlConfigSource;
pub use project::{config_dir, load_project_config};
