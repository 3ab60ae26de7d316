// refdq-core/src/application/staging.rs

use tracing::{info, instrument, warn};

use crate::domain::error::DomainError;
use crate::domain::schema::{compare_columns, compare_schemas};
use crate::domain::session::{BlockReason, SchemaReport, StagingReport};
use crate::domain::target::Target;
use crate::domain::upload::{StagedDataset, staging_table_name};
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Writes the upload to the session's staging table (overwriting it) and reads
/// back both schemas.
#[instrument(skip(connector, target, data), fields(target = %target.name, rows = data.len()))]
pub async fn stage_upload(
    connector: &dyn Connector,
    target: &Target,
    temp_schema: &str,
    data: &StagedDataset,
) -> Result<StagingReport, RefdqError> {
    let target_schema = connector.describe_schema(&target.target_table).await?;
    if !target_schema.contains(&target.primary_key) {
        return Err(DomainError::UnknownPrimaryKey {
            table: target.target_table.clone(),
            column: target.primary_key.clone(),
        }
        .into());
    }

    let stage_table = staging_table_name(temp_schema, &target.target_table);
    connector.write_staging(&stage_table, data).await?;
    let staged_schema = connector.describe_schema(&stage_table).await?;

    info!("📥 Staged {} rows into {}", data.len(), stage_table);
    Ok(StagingReport {
        stage_table,
        target_table: target.target_table.clone(),
        target_schema,
        staged_schema,
        staged_rows: data.len(),
    })
}

/// Presence-only gate. Missing columns can be waived with `ignore_schema_errors`;
/// a missing primary key cannot.
pub fn reconcile_schema(
    staging: &StagingReport,
    primary_key: &str,
    ignore_schema_errors: bool,
) -> (SchemaReport, Option<BlockReason>) {
    let missing_columns = compare_columns(&staging.target_schema, &staging.staged_schema);
    let mismatches = compare_schemas(&staging.target_schema, &staging.staged_schema);
    let primary_key_missing = !staging.staged_schema.contains(primary_key);

    let blocked = if primary_key_missing {
        Some(BlockReason::MissingPrimaryKey)
    } else if !missing_columns.is_empty() && !ignore_schema_errors {
        Some(BlockReason::SchemaMismatch)
    } else {
        None
    };

    if !missing_columns.is_empty() {
        warn!(
            "Upload is missing target columns {:?} (ignored: {})",
            missing_columns, ignore_schema_errors
        );
    }

    let overridden = ignore_schema_errors && !missing_columns.is_empty() && blocked.is_none();
    (
        SchemaReport {
            missing_columns,
            mismatches,
            primary_key_missing,
            overridden,
        },
        blocked,
    )
}
