// refdq-core/src/application/checks.rs

use serde_json::json;
use tracing::{info, instrument, warn};

use crate::application::engine::execute_query;
use crate::application::ports::TemplateEngine;
use crate::domain::compiler::VariableScope;
use crate::domain::compiler::quoter::{Quoter, cast_expression, cast_projection};
use crate::domain::error::DomainError;
use crate::domain::session::{CheckReport, StagingReport};
use crate::domain::target::{Check, CheckRegistry, CheckResult, Target};
use crate::domain::upload::UploadMode;
use crate::error::RefdqError;
use crate::ports::connector::Connector;

// The table as it would look after the merge: every staged row, plus the target
// rows whose key the upload does not touch.
const MERGED_TABLE_SQL: &str = r#"
(
    SELECT {{ projection }} FROM {{ stage_table }}
    UNION ALL
    SELECT {{ columns }} FROM {{ target_table }} AS t
    WHERE NOT EXISTS (
        SELECT 1 FROM {{ stage_table }} AS s
        WHERE {{ staged_key }} = t.{{ primary_key | ident }}
    )
) AS __union__t
"#;

/// Relation the checks run against: the virtual post-merge table in merge
/// mode, the staging table in replace mode.
pub fn relation_under_test(
    renderer: &dyn TemplateEngine,
    mode: UploadMode,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<String, RefdqError> {
    match mode {
        UploadMode::Replace => Ok(staging.stage_table.clone()),
        UploadMode::Merge => {
            let key_type = staging
                .target_schema
                .get(primary_key)
                .map(|c| c.data_type.as_str())
                .ok_or_else(|| DomainError::UnknownPrimaryKey {
                    table: staging.target_table.clone(),
                    column: primary_key.to_string(),
                })?;
            renderer.render(
                MERGED_TABLE_SQL,
                &json!({
                    "projection": cast_projection(&staging.target_schema, &staging.staged_schema, None),
                    "columns": Quoter::column_list(staging.target_schema.names()),
                    "staged_key": cast_expression(&format!("s.{}", Quoter::ident(primary_key)), key_type),
                    "primary_key": primary_key,
                    "stage_table": staging.stage_table,
                    "target_table": staging.target_table,
                }),
            )
        }
    }
}

/// Binds every check invocation of the target, in declaration order.
/// An unknown type or an unbound placeholder fails the whole batch.
pub fn bind_checks(
    target: &Target,
    registry: &CheckRegistry,
    table: &str,
) -> Result<Vec<Check>, DomainError> {
    let general = VariableScope::new()
        .with_general("table", table)
        .with_general("primary_key", target.primary_key.as_str())
        .with_general("target_table", target.target_table.as_str());

    target
        .checks
        .iter()
        .map(|invocation| {
            let definition = registry.get(&invocation.check_type).ok_or_else(|| {
                DomainError::UnknownCheckType {
                    check_type: invocation.check_type.clone(),
                    target: target.name.clone(),
                }
            })?;
            Check::bind(definition, invocation, &general, &target.name)
        })
        .collect()
}

/// Executes the checks one after another. A backend error aborts the run:
/// a check that could not execute never counts as passed.
#[instrument(skip_all, fields(checks = checks.len()))]
pub async fn run_checks(connector: &dyn Connector, checks: Vec<Check>) -> Result<CheckReport, RefdqError> {
    let mut results = Vec::with_capacity(checks.len());

    for check in checks {
        let rows = execute_query(connector, check.sql.as_str()).await?;
        let result = CheckResult::new(check, rows);
        if result.passed {
            info!("✅ Check '{}' passed", result.check_type);
        } else {
            warn!(
                "❌ Check '{}' failed with {} rows",
                result.check_type,
                result.rows.len()
            );
        }
        results.push(result);
    }

    let all_passed = results.iter().all(|r| r.passed);
    Ok(CheckReport {
        results,
        all_passed,
    })
}
