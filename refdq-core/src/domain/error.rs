// refdq-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    // --- TEMPLATES ---
    #[error("Argument '{variable}' is required for {context}")]
    #[diagnostic(
        code(refdq::domain::missing_variable),
        help("Declare '{variable}' on the check entry of the target, or remove the placeholder from the check definition.")
    )]
    MissingVariable { variable: String, context: String },

    #[error("Malformed template in {context}: {reason}")]
    #[diagnostic(
        code(refdq::domain::template_syntax),
        help("Placeholders look like {{name}}. Write '{{{{' and '}}}}' for literal braces.")
    )]
    MalformedTemplate { context: String, reason: String },

    // --- CONFIGURATION ---
    #[error("Definition '{source_name}' must contain key '{key}'")]
    #[diagnostic(code(refdq::domain::config))]
    InvalidConfig { source_name: String, key: String },

    #[error("Unknown check type '{check_type}' referenced by target '{target}'")]
    #[diagnostic(
        code(refdq::domain::unknown_check),
        help("Add a definition file named '{check_type}.yaml' to the checks directory.")
    )]
    UnknownCheckType { check_type: String, target: String },

    #[error("Configuration source error: {0}")]
    #[diagnostic(code(refdq::domain::config_source))]
    ConfigSource(String),

    #[error("No target configured for '{0}'")]
    #[diagnostic(code(refdq::domain::target_not_found))]
    TargetNotFound(String),

    #[error("Table '{table}' is claimed by several targets: {candidates:?}")]
    #[diagnostic(code(refdq::domain::ambiguous_target))]
    AmbiguousTarget {
        table: String,
        candidates: Vec<String>,
    },

    #[error("Primary key '{column}' is not a column of '{table}'")]
    #[diagnostic(code(refdq::domain::primary_key))]
    UnknownPrimaryKey { table: String, column: String },

    // --- UPLOAD ---
    #[error("upload_type must be 'merge' or 'replace', got '{0}'")]
    #[diagnostic(code(refdq::domain::upload_mode))]
    InvalidUploadMode(String),

    #[error("Uploaded data declares no columns")]
    #[diagnostic(code(refdq::domain::empty_upload))]
    EmptyUpload,

    #[error("Duplicate column '{0}' in uploaded data (headers are compared case-insensitively)")]
    #[diagnostic(code(refdq::domain::duplicate_column))]
    DuplicateColumn(String),

    #[error("Row {row} has {found} values but the header declares {expected} columns")]
    #[diagnostic(code(refdq::domain::ragged_row))]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    // --- SESSION ---
    #[error("Stage '{attempted}' cannot run while the session is {current}")]
    #[diagnostic(code(refdq::domain::stage_order))]
    StageOutOfOrder { attempted: String, current: String },
}
