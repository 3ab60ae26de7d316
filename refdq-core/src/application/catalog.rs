// refdq-core/src/application/catalog.rs

use tracing::{info, instrument};

use crate::application::engine::execute_query;
use crate::domain::error::DomainError;
use crate::domain::ports::ConfigSource;
use crate::domain::row::Row;
use crate::domain::target::{CheckRegistry, TargetSet};
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Targets and check definitions, validated against each other.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub targets: TargetSet,
    pub checks: CheckRegistry,
}

/// Loads and cross-checks configuration. Any error here aborts before a
/// session can start.
#[instrument(skip_all)]
pub fn load_catalog(source: &dyn ConfigSource) -> Result<Catalog, DomainError> {
    let checks = CheckRegistry::from_documents(source.list_check_definitions()?)?;
    let targets = TargetSet::from_documents(source.list_targets()?)?;
    targets.validate_checks(&checks)?;

    info!(
        "📚 Catalog loaded: {} targets, {} check types",
        targets.len(),
        checks.len()
    );
    Ok(Catalog { targets, checks })
}

/// First `limit` rows of a target table.
pub async fn target_sample(
    connector: &dyn Connector,
    table: &str,
    limit: usize,
) -> Result<Vec<Row>, RefdqError> {
    execute_query(connector, &format!("SELECT * FROM {table} LIMIT {limit}")).await
}
