// refdq-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::domain::row::Row;
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Runs one statement through the connector with timing and logging.
/// Backend errors are logged and returned unchanged; nothing is retried.
#[instrument(skip(connector, query), fields(engine = connector.engine_name(), query.len = query.len()))]
pub async fn execute_query(connector: &dyn Connector, query: &str) -> Result<Vec<Row>, RefdqError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", query);

    let result = connector.execute(query).await;
    let duration = start.elapsed();

    match result {
        Ok(rows) => {
            debug!("✅ Query finished in {:.2?} ({} rows)", duration, rows.len());
            Ok(rows)
        }
        Err(e) => {
            error!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MockConnector;

    #[tokio::test]
    async fn test_execute_query_returns_rows_and_records_sql() {
        let connector = MockConnector::new().with_rows("select 1", vec![Row::new().with("X", 1)]);
        let rows = execute_query(&connector, "select 1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(connector.queries(), ["select 1"]);
    }

    #[tokio::test]
    async fn test_execute_query_propagates_failures() {
        let connector = MockConnector::new().failing_on("broken");
        let err = execute_query(&connector, "select * from broken").await.unwrap_err();
        assert!(err.is_backend_error());
    }
}
