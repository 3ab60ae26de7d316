// refdq-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::project::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

const PROJECT_FILES: [&str; 2] = ["refdq_project_conf.yaml", "refdq.yaml"];

/// Loads the project file from `project_dir`, then applies environment overrides.
/// Without a project file every setting takes its default.
#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let mut config = match find_main_config(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading project configuration");
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str(&content).map_err(|source| InfrastructureError::YamlError {
                path: path.display().to_string(),
                source,
            })?
        }
        None => {
            warn!(
                "No project file in {:?} (looked for {:?}); using defaults",
                project_dir, PROJECT_FILES
            );
            ProjectConfig::default()
        }
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Directory holding `tables/` and `checks/`.
pub fn config_dir(project_dir: &Path, config: &ProjectConfig) -> PathBuf {
    let configured = Path::new(&config.config_path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        project_dir.join(configured)
    }
}

fn find_main_config(root: &Path) -> Option<PathBuf> {
    PROJECT_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

// Layering: REFDQ_CONFIG_PATH=/etc/refdq refdq validate ...
fn apply_overrides(config: &mut ProjectConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("REFDQ_CONFIG_PATH") {
        info!(old = ?config.config_path, new = ?val, "Overriding config path via ENV");
        config.config_path = val;
    }
    if let Some(val) = lookup("REFDQ_TEMP_SCHEMA") {
        info!(old = ?config.temp_schema, new = ?val, "Overriding temp schema via ENV");
        config.temp_schema = val;
    }
    if let Some(val) = lookup("REFDQ_DATABASE") {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use crate::domain::project::Dialect;
    use tempfile::tempdir;

    #[test]
    fn test_loads_project_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("refdq.yaml"),
            "name: refdata\nconfig_path: conf\ndialect: snowflake\nmax_error_rows: 50\n",
        )?;

        let config = load_project_config(dir.path())?;
        assert_eq!(config.name, "refdata");
        assert_eq!(config.dialect, Dialect::Snowflake);
        assert_eq!(config.max_error_rows, 50);
        assert_eq!(config_dir(dir.path(), &config), dir.path().join("conf"));
        Ok(())
    }

    #[test]
    fn test_missing_project_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = load_project_config(dir.path())?;
        assert_eq!(config.temp_schema, "REFDQ_STAGING");
        Ok(())
    }

    #[test]
    fn test_invalid_values_fail_validation() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("refdq.yaml"), "max_error_rows: 0\n")?;
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::Validation(_)));
        Ok(())
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = ProjectConfig::default();
        apply_overrides(&mut config, |key| match key {
            "REFDQ_TEMP_SCHEMA" => Some("SCRATCH".to_string()),
            _ => None,
        });
        assert_eq!(config.temp_schema, "SCRATCH");
        assert_eq!(config.database, "refdq.duckdb");
    }
}
