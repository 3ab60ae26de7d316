// refdq-core/src/application/type_check.rs

use serde_json::json;
use tracing::{info, instrument};

use crate::application::engine::execute_query;
use crate::application::ports::TemplateEngine;
use crate::domain::compiler::quoter::is_variable_length_string;
use crate::domain::session::{StagingReport, TypeReport};
use crate::error::RefdqError;
use crate::ports::connector::Connector;

// One branch per column: staged values that are set but do not survive TRY_CAST.
const TYPE_CHECK_SQL: &str = r#"
{% for column in columns %}
SELECT {{ primary_key | ident }} AS primary_key, {{ column.name | literal }} AS column_name, {{ column.name | ident }} AS value, {{ column.data_type | literal }} AS expected_data_type
FROM {{ stage_table }}
WHERE {{ column.name | ident }} IS NOT NULL AND TRY_CAST({{ column.name | ident }} AS {{ column.data_type }}) IS NULL
{% if not loop.last %}
UNION ALL
{% endif %}
{% endfor %}
ORDER BY 1, 2
"#;

/// Renders the type check, or `None` when no staged column needs a cast check.
/// String-typed target columns accept any value and are skipped.
pub fn build_type_check(
    renderer: &dyn TemplateEngine,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<Option<(Vec<String>, String)>, RefdqError> {
    let columns: Vec<_> = staging
        .target_schema
        .columns()
        .iter()
        .filter(|c| !is_variable_length_string(&c.data_type))
        .filter(|c| staging.staged_schema.contains(&c.name))
        .collect();

    if columns.is_empty() {
        return Ok(None);
    }

    let sql = renderer.render(
        TYPE_CHECK_SQL,
        &json!({
            "columns": columns,
            "primary_key": primary_key,
            "stage_table": staging.stage_table,
        }),
    )?;
    Ok(Some((columns.iter().map(|c| c.name.clone()).collect(), sql)))
}

#[instrument(skip_all, fields(stage_table = %staging.stage_table))]
pub async fn check_types(
    connector: &dyn Connector,
    renderer: &dyn TemplateEngine,
    staging: &StagingReport,
    primary_key: &str,
) -> Result<TypeReport, RefdqError> {
    let Some((checked_columns, sql)) = build_type_check(renderer, staging, primary_key)? else {
        info!("No typed columns to check");
        return Ok(TypeReport {
            checked_columns: Vec::new(),
            violations: Vec::new(),
        });
    };

    let violations = execute_query(connector, &sql).await?;
    info!(
        "🔎 Type check over {} columns: {} violations",
        checked_columns.len(),
        violations.len()
    );
    Ok(TypeReport {
        checked_columns,
        violations,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::schema::TableSchema;
    use crate::infrastructure::compiler::jinja::JinjaRenderer;
    use crate::test_support::MockConnector;

    fn staging(staged: &[&str]) -> StagingReport {
        StagingReport {
            stage_table: "TMP.NAMES".into(),
            target_table: "REFDATA.NAMES".into(),
            target_schema: TableSchema::from_pairs([
                ("ID", "INTEGER"),
                ("NAME", "VARCHAR"),
                ("AGE", "INTEGER"),
            ]),
            staged_schema: TableSchema::from_pairs(staged.iter().map(|c| (*c, "VARCHAR"))),
            staged_rows: 3,
        }
    }

    #[test]
    fn test_string_columns_are_exempt() {
        let renderer = JinjaRenderer::new();
        let (columns, sql) = build_type_check(&renderer, &staging(&["ID", "NAME", "AGE"]), "ID")
            .unwrap()
            .unwrap();
        assert_eq!(columns, ["ID", "AGE"]);
        assert!(!sql.contains("'NAME'"));
        assert_eq!(sql.matches("UNION ALL").count(), 1);
        assert!(sql.contains("TRY_CAST(\"AGE\" AS INTEGER) IS NULL"));
        assert!(sql.ends_with("ORDER BY 1, 2"));
    }

    #[test]
    fn test_columns_absent_from_upload_are_skipped() {
        let renderer = JinjaRenderer::new();
        let (columns, _) = build_type_check(&renderer, &staging(&["ID", "NAME"]), "ID")
            .unwrap()
            .unwrap();
        assert_eq!(columns, ["ID"]);
    }

    #[tokio::test]
    async fn test_no_query_when_nothing_to_check() {
        let mut report = staging(&["NAME"]);
        report.target_schema = TableSchema::from_pairs([("NAME", "VARCHAR")]);
        let connector = MockConnector::new();
        let renderer = JinjaRenderer::new();

        let types = check_types(&connector, &renderer, &report, "NAME").await.unwrap();
        assert!(types.violations.is_empty());
        assert!(connector.queries().is_empty());
    }
}
