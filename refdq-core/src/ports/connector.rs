// refdq-core/src/ports/connector.rs

// The backend contract. Everything the gateway learns about the data it learns
// through these calls; it never executes SQL itself.

use async_trait::async_trait;

use crate::domain::row::Row;
use crate::domain::schema::TableSchema;
use crate::domain::upload::StagedDataset;
use crate::error::RefdqError;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs one statement and returns its rows in order. Statements without a
    /// result set return an empty vector.
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RefdqError>;

    /// Column name (upper-cased) -> type name, in table order.
    async fn describe_schema(&self, table: &str) -> Result<TableSchema, RefdqError>;

    /// Overwrites `table` with the dataset. Every column is created as text.
    async fn write_staging(&self, table: &str, data: &StagedDataset) -> Result<(), RefdqError>;

    fn engine_name(&self) -> &str;
}
