// refdq-core/src/domain/project.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// SQL flavour of the backend. Only the replace-mode write differs.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Snowflake,
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    /// Directory holding `tables/` and `checks/`, relative to the project file.
    #[serde(default = "default_config_path")]
    pub config_path: String,

    #[validate(length(min = 1, message = "temp_schema cannot be empty"))]
    #[serde(default = "default_temp_schema")]
    pub temp_schema: String,

    #[validate(length(min = 1, message = "database cannot be empty"))]
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub dialect: Dialect,

    #[validate(range(min = 1, message = "max_error_rows must be at least 1"))]
    #[serde(default = "default_max_error_rows")]
    pub max_error_rows: usize,

    #[validate(range(min = 1, max = 100000))]
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            config_path: default_config_path(),
            temp_schema: default_temp_schema(),
            database: default_database(),
            dialect: Dialect::default(),
            max_error_rows: default_max_error_rows(),
            sample_rows: default_sample_rows(),
        }
    }
}

fn default_name() -> String {
    "refdq".to_string()
}
fn default_config_path() -> String {
    ".".to_string()
}
fn default_temp_schema() -> String {
    "REFDQ_STAGING".to_string()
}
fn default_database() -> String {
    "refdq.duckdb".to_string()
}
fn default_max_error_rows() -> usize {
    10000
}
fn default_sample_rows() -> usize {
    100
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: ProjectConfig = serde_yaml::from_str("name: demo\ndialect: snowflake\n").unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.dialect, Dialect::Snowflake);
        assert_eq!(config.temp_schema, "REFDQ_STAGING");
        assert_eq!(config.max_error_rows, 10000);
        assert_eq!(config.sample_rows, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_temp_schema_fails_validation() {
        let config: ProjectConfig = serde_yaml::from_str("temp_schema: ''\n").unwrap();
        assert!(config.validate().is_err());
    }
}
