// refdq-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(refdq::infra::database::duckdb),
        help("The backend rejected the statement. Nothing is retried.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Connection lock poisoned")]
    #[diagnostic(code(refdq::infra::database::poisoned))]
    Poisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(refdq::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error in '{path}': {source}")]
    #[diagnostic(
        code(refdq::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(refdq::infra::config))]
    ConfigError(String),

    #[error("Configuration directory not found at '{0}'")]
    #[diagnostic(
        code(refdq::infra::config_missing),
        help("config_path must point to a directory containing 'tables/' and 'checks/'.")
    )]
    ConfigNotFound(String),

    #[error("Invalid project configuration: {0}")]
    #[diagnostic(code(refdq::infra::validation))]
    Validation(#[from] validator::ValidationErrors),

    // --- UPLOAD ---
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(refdq::infra::csv),
        help("The upload must be a comma-separated file with a header row.")
    )]
    Csv(#[from] csv::Error),

    #[error("Serialization Error: {0}")]
    #[diagnostic(code(refdq::infra::json))]
    Json(#[from] serde_json::Error),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(refdq::infra::template),
        help("A built-in statement template failed to render.")
    )]
    TemplateError(#[from] minijinja::Error),
}

impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
