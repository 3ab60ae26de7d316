// refdq-core/src/application/write.rs

use serde_json::json;
use tracing::{info, instrument};

use crate::application::engine::execute_query;
use crate::application::ports::TemplateEngine;
use crate::domain::compiler::quoter::{Quoter, cast_projection};
use crate::domain::project::Dialect;
use crate::domain::session::{StagingReport, WriteReport};
use crate::domain::upload::UploadMode;
use crate::error::RefdqError;
use crate::ports::connector::Connector;

const MERGE_SQL: &str = r#"
MERGE INTO {{ target_table }} AS tgt
USING (SELECT {{ projection }} FROM {{ stage_table }}) AS src
ON tgt.{{ primary_key | ident }} = src.{{ primary_key | ident }}
WHEN MATCHED THEN UPDATE SET {% for c in updates %}{{ c | ident }} = src.{{ c | ident }}{% if not loop.last %}, {% endif %}{% endfor %}

WHEN NOT MATCHED THEN INSERT ({{ columns }}) VALUES ({% for c in names %}src.{{ c | ident }}{% if not loop.last %}, {% endif %}{% endfor %})
"#;

const INSERT_OVERWRITE_SQL: &str = r#"
INSERT OVERWRITE INTO {{ target_table }} ({{ columns }})
SELECT {{ projection }} FROM {{ stage_table }}
"#;

const DELETE_SQL: &str = "DELETE FROM {{ target_table }}";

const INSERT_SQL: &str = r#"
INSERT INTO {{ target_table }} ({{ columns }})
SELECT {{ projection }} FROM {{ stage_table }}
"#;

/// Statements applying the upload. Only target columns are written, in target
/// order; extra staged columns are dropped.
pub fn build_write_statements(
    renderer: &dyn TemplateEngine,
    dialect: Dialect,
    mode: UploadMode,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<Vec<String>, RefdqError> {
    let names: Vec<&str> = staging.target_schema.names().collect();
    // The key already matches on update; a key-only table still needs one SET item.
    let mut updates: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| !n.eq_ignore_ascii_case(primary_key))
        .collect();
    if updates.is_empty() {
        updates.push(primary_key);
    }

    let context = json!({
        "target_table": staging.target_table,
        "stage_table": staging.stage_table,
        "primary_key": primary_key,
        "projection": cast_projection(&staging.target_schema, &staging.staged_schema, None),
        "columns": Quoter::column_list(names.iter().copied()),
        "names": names,
        "updates": updates,
    });

    let templates: &[&str] = match (mode, dialect) {
        (UploadMode::Merge, _) => &[MERGE_SQL],
        (UploadMode::Replace, Dialect::Snowflake) => &[INSERT_OVERWRITE_SQL],
        (UploadMode::Replace, Dialect::DuckDb) => &[DELETE_SQL, INSERT_SQL],
    };
    templates
        .iter()
        .map(|t| renderer.render(t, &context))
        .collect()
}

/// Runs the statements in order. There is no transaction around them.
#[instrument(skip_all, fields(mode = %mode, target_table = %staging.target_table))]
pub async fn apply_write(
    connector: &dyn Connector,
    renderer: &dyn TemplateEngine,
    dialect: Dialect,
    mode: UploadMode,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<WriteReport, RefdqError> {
    let statements = build_write_statements(renderer, dialect, mode, staging, primary_key)?;
    for statement in &statements {
        execute_query(connector, statement).await?;
    }
    info!("💾 {} upload written to {}", mode, staging.target_table);
    Ok(WriteReport { mode, statements })
}
