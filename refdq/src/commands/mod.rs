// refdq/src/commands/mod.rs

pub mod checks;
pub mod display;
pub mod sample;
pub mod targets;
pub mod validate;

use anyhow::Context;
use std::path::{Path, PathBuf};

use refdq_core::application::{Catalog, load_catalog};
use refdq_core::domain::project::ProjectConfig;
use refdq_core::infrastructure::adapters::duckdb::DuckDBConnector;
use refdq_core::infrastructure::config::{YamlConfigSource, config_dir, load_project_config};

/// Project file plus validated targets and checks.
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub catalog: Catalog,
}

impl Project {
    pub fn load(project_dir: &Path) -> anyhow::Result<Self> {
        let config = load_project_config(project_dir).with_context(|| {
            format!("Failed to load project configuration from {:?}", project_dir)
        })?;
        let source = YamlConfigSource::new(config_dir(project_dir, &config));
        let catalog = load_catalog(&source)
            .with_context(|| format!("Invalid configuration under {:?}", source.root()))?;

        Ok(Self {
            root: project_dir.to_path_buf(),
            config,
            catalog,
        })
    }

    pub fn connect(&self) -> anyhow::Result<DuckDBConnector> {
        let db_path = self.database_path();
        DuckDBConnector::new(&db_path)
            .with_context(|| format!("Failed to open DuckDB at {}", db_path))
    }

    fn database_path(&self) -> String {
        let configured = Path::new(&self.config.database);
        if self.config.database == ":memory:" || configured.is_absolute() {
            self.config.database.clone()
        } else {
            self.root.join(configured).display().to_string()
        }
    }
}
