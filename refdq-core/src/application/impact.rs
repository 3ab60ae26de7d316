// refdq-core/src/application/impact.rs

use serde_json::json;
use tracing::{info, instrument};

use crate::application::engine::execute_query;
use crate::application::ports::TemplateEngine;
use crate::domain::compiler::quoter::{Quoter, cast_projection};
use crate::domain::impact::Impact;
use crate::domain::session::StagingReport;
use crate::domain::upload::UploadMode;
use crate::error::RefdqError;
use crate::ports::connector::Connector;

// `changed` holds staged rows (cast to target types) that do not already exist
// verbatim in the target. Joined back on the key it splits into inserts and updates.
const MERGE_IMPACT_SQL: &str = r#"
WITH changed AS (
    SELECT {{ projection }} FROM {{ stage_table }}
    EXCEPT
    SELECT {{ columns }} FROM {{ target_table }}
)
SELECT
    COUNT_IF(t.{{ primary_key | ident }} IS NULL) AS inserted,
    COUNT_IF(t.{{ primary_key | ident }} IS NOT NULL AND c.{{ primary_key | ident }} IS NOT NULL) AS updated,
    COUNT_IF(t.{{ primary_key | ident }} IS NOT NULL) AS table_rows,
    COUNT_IF(c.{{ primary_key | ident }} IS NOT NULL) AS upload_rows
FROM {{ target_table }} AS t
FULL JOIN changed AS c ON t.{{ primary_key | ident }} = c.{{ primary_key | ident }}
"#;

const REPLACE_IMPACT_SQL: &str = r#"
SELECT
    (SELECT COUNT(*) FROM {{ target_table }}) AS table_rows,
    (SELECT COUNT(*) FROM {{ stage_table }}) AS upload_rows
"#;

pub fn build_impact_query(
    renderer: &dyn TemplateEngine,
    mode: UploadMode,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<String, RefdqError> {
    let template = match mode {
        UploadMode::Merge => MERGE_IMPACT_SQL,
        UploadMode::Replace => REPLACE_IMPACT_SQL,
    };
    renderer.render(
        template,
        &json!({
            "projection": cast_projection(&staging.target_schema, &staging.staged_schema, None),
            "columns": Quoter::column_list(staging.target_schema.names()),
            "primary_key": primary_key,
            "stage_table": staging.stage_table,
            "target_table": staging.target_table,
        }),
    )
}

/// One query per mode; the arithmetic runs in the backend.
#[instrument(skip_all, fields(mode = %mode, target_table = %staging.target_table))]
pub async fn assess_impact(
    connector: &dyn Connector,
    renderer: &dyn TemplateEngine,
    mode: UploadMode,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<Impact, RefdqError> {
    let sql = build_impact_query(renderer, mode, staging, primary_key)?;
    let rows = execute_query(connector, &sql).await?;
    let row = rows
        .first()
        .ok_or_else(|| RefdqError::InternalError("Impact query returned no rows".into()))?;

    let count = |name: &str| {
        row.get_u64(name).ok_or_else(|| {
            RefdqError::InternalError(format!("Impact query returned no count for '{name}'"))
        })
    };

    let impact = match mode {
        UploadMode::Merge => Impact::merge(
            count("inserted")?,
            count("updated")?,
            count("table_rows")?,
            count("upload_rows")?,
        ),
        UploadMode::Replace => Impact::replace(count("table_rows")?, count("upload_rows")?),
    };
    info!(?impact, "📊 Impact assessed");
    Ok(impact)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::row::Row;
    use crate::domain::schema::TableSchema;
    use crate::infrastructure::compiler::jinja::JinjaRenderer;
    use crate::test_support::MockConnector;

    fn staging() -> StagingReport {
        StagingReport {
            stage_table: "TMP.NAMES".into(),
            target_table: "REFDATA.NAMES".into(),
            target_schema: TableSchema::from_pairs([("ID", "INTEGER"), ("NAME", "VARCHAR")]),
            staged_schema: TableSchema::from_pairs([("ID", "VARCHAR"), ("NAME", "VARCHAR")]),
            staged_rows: 2,
        }
    }

    #[test]
    fn test_merge_query_subtracts_target_rows() {
        let sql = build_impact_query(&JinjaRenderer::new(), UploadMode::Merge, &staging(), "ID").unwrap();
        assert!(sql.contains(
            "SELECT TRY_CAST(\"ID\" AS INTEGER) AS \"ID\", CAST(\"NAME\" AS VARCHAR) AS \"NAME\" FROM TMP.NAMES"
        ));
        assert!(sql.contains("EXCEPT\n    SELECT \"ID\", \"NAME\" FROM REFDATA.NAMES"));
        assert!(sql.contains("FULL JOIN changed AS c ON t.\"ID\" = c.\"ID\""));
    }

    #[test]
    fn test_replace_query_only_counts() {
        let sql = build_impact_query(&JinjaRenderer::new(), UploadMode::Replace, &staging(), "ID").unwrap();
        assert!(sql.contains("(SELECT COUNT(*) FROM REFDATA.NAMES) AS table_rows"));
        assert!(!sql.contains("JOIN"));
    }

    #[tokio::test]
    async fn test_counts_are_read_from_first_row() {
        let connector = MockConnector::new().with_rows(
            "COUNT_IF",
            vec![
                Row::new()
                    .with("INSERTED", 1)
                    .with("UPDATED", 2)
                    .with("TABLE_ROWS", 10)
                    .with("UPLOAD_ROWS", "3"),
            ],
        );
        let impact = assess_impact(&connector, &JinjaRenderer::new(), UploadMode::Merge, &staging(), "ID")
            .await
            .unwrap();
        assert_eq!(impact, Impact::merge(1, 2, 10, 3));
    }

    #[tokio::test]
    async fn test_missing_result_is_internal_error() {
        let connector = MockConnector::new();
        let err = assess_impact(&connector, &JinjaRenderer::new(), UploadMode::Replace, &staging(), "ID")
            .await
            .unwrap_err();
        assert!(matches!(err, RefdqError::InternalError(_)));
    }
}
