// refdq-core/src/infrastructure/config/catalog.rs

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::error::DomainError;
use crate::domain::ports::ConfigSource;
use crate::domain::target::{CheckDocument, TargetDocument};
use crate::infrastructure::error::InfrastructureError;

const SUPPORTED_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Reads `tables/<name>.yaml` and `checks/<type>.yaml` under a config directory.
/// The file stem is the target name or check type.
pub struct YamlConfigSource {
    root: PathBuf,
}

impl YamlConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ConfigSource for YamlConfigSource {
    fn list_targets(&self) -> Result<BTreeMap<String, TargetDocument>, DomainError> {
        let dir = self.root.join("tables");
        if !dir.is_dir() {
            return Err(config_error(InfrastructureError::ConfigNotFound(
                dir.display().to_string(),
            )));
        }
        load_documents(&dir).map_err(config_error)
    }

    fn list_check_definitions(&self) -> Result<BTreeMap<String, CheckDocument>, DomainError> {
        let dir = self.root.join("checks");
        if !dir.is_dir() {
            warn!("No checks directory at {:?}; no check types registered", dir);
            return Ok(BTreeMap::new());
        }
        load_documents(&dir).map_err(config_error)
    }
}

fn config_error(err: InfrastructureError) -> DomainError {
    DomainError::ConfigSource(err.to_string())
}

fn load_documents<T: DeserializeOwned>(dir: &Path) -> Result<BTreeMap<String, T>, InfrastructureError> {
    let mut documents = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e));
        if !entry.file_type().is_file() || !supported {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let content = fs::read_to_string(path)?;
        let document: T =
            serde_yaml::from_str(&content).map_err(|source| InfrastructureError::YamlError {
                path: path.display().to_string(),
                source,
            })?;
        if documents.insert(stem.to_string(), document).is_some() {
            return Err(InfrastructureError::ConfigError(format!(
                "'{}' is defined twice in {}",
                stem,
                dir.display()
            )));
        }
        debug!("Loaded {:?}", path);
    }

    Ok(documents)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn project() -> Result<tempfile::TempDir> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("tables"))?;
        fs::create_dir_all(dir.path().join("checks"))?;
        fs::write(
            dir.path().join("tables/names.yaml"),
            "target_table: REFDATA.NAMES\nprimary_key: ID\nchecks:\n  - type: unique\n    column: ID\n",
        )?;
        fs::write(
            dir.path().join("checks/unique.yml"),
            "type: unique\nsql: select * from {table}\n",
        )?;
        fs::write(dir.path().join("checks/README.md"), "ignored")?;
        Ok(dir)
    }

    #[test]
    fn test_discovers_targets_and_checks_by_stem() -> Result<()> {
        let dir = project()?;
        let source = YamlConfigSource::new(dir.path());

        let targets = source.list_targets()?;
        assert_eq!(targets.keys().collect::<Vec<_>>(), ["names"]);
        assert_eq!(targets["names"].checks.len(), 1);

        let checks = source.list_check_definitions()?;
        assert_eq!(checks.keys().collect::<Vec<_>>(), ["unique"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_stems_are_rejected() -> Result<()> {
        let dir = project()?;
        fs::write(dir.path().join("checks/unique.yaml"), "type: unique\nsql: select 1\n")?;
        let err = YamlConfigSource::new(dir.path())
            .list_check_definitions()
            .unwrap_err();
        assert!(matches!(err, DomainError::ConfigSource(msg) if msg.contains("defined twice")));
        Ok(())
    }

    #[test]
    fn test_missing_tables_directory_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let err = YamlConfigSource::new(dir.path()).list_targets().unwrap_err();
        assert!(matches!(err, DomainError::ConfigSource(_)));
        Ok(())
    }
}
