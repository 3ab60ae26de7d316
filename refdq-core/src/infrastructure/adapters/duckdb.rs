// refdq-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{Config, Connection, params_from_iter};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::compiler::quoter::Quoter;
use crate::domain::row::Row;
use crate::domain::schema::TableSchema;
use crate::domain::upload::StagedDataset;
use crate::error::RefdqError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::Connector;

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RefdqError> {
        self.conn
            .lock()
            .map_err(|_| RefdqError::Infrastructure(DatabaseError::Poisoned.into()))
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RefdqError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;
        let names: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, name) in names.iter().enumerate() {
                let value: DuckValue = row.get(index)?;
                record.push(name.clone(), to_json(value));
            }
            out.push(record);
        }
        Ok(out)
    }

    async fn describe_schema(&self, table: &str) -> Result<TableSchema, RefdqError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("DESCRIBE {table}"))?;
        let columns = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut schema = TableSchema::new();
        for column in columns {
            let (name, data_type) = column?;
            schema.push(&name, data_type);
        }
        Ok(schema)
    }

    async fn write_staging(&self, table: &str, data: &StagedDataset) -> Result<(), RefdqError> {
        let mut conn = self.lock()?;

        if let Some((schema, _)) = table.rsplit_once('.') {
            conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
        }

        let definition = data
            .columns()
            .iter()
            .map(|c| format!("{} VARCHAR", Quoter::ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!("CREATE OR REPLACE TABLE {table} ({definition})"))?;

        let placeholders = vec!["?"; data.columns().len()].join(", ");
        let insert = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            Quoter::column_list(data.columns().iter().map(String::as_str))
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in data.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        tracing::debug!("Staged {} rows into {}", data.len(), table);
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::from(i),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::HugeInt(i) => i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string())),
        DuckValue::UTinyInt(i) => Value::from(i),
        DuckValue::USmallInt(i) => Value::from(i),
        DuckValue::UInt(i) => Value::from(i),
        DuckValue::UBigInt(i) => Value::from(i),
        DuckValue::Float(f) => Value::from(f64::from(f)),
        DuckValue::Double(f) => Value::from(f),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, ticks) => {
            let micros = match unit {
                TimeUnit::Second => ticks.saturating_mul(1_000_000),
                TimeUnit::Millisecond => ticks.saturating_mul(1_000),
                TimeUnit::Microsecond => ticks,
                TimeUnit::Nanosecond => ticks / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|t| Value::String(t.naive_utc().to_string()))
                .unwrap_or(Value::Null)
        }
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(to_json).collect())
        }
        other => Value::String(format!("{other:?}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn test_execute_returns_named_rows() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .execute("CREATE TABLE users (id INTEGER, name VARCHAR, born DATE)")
            .await?;
        connector
            .execute("INSERT INTO users VALUES (1, 'Ada', DATE '1815-12-10'), (2, NULL, NULL)")
            .await?;

        let rows = connector
            .execute("SELECT id, name, born FROM users ORDER BY id")
            .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_u64("ID"), Some(1));
        assert_eq!(rows[0].get("name"), Some(&Value::from("Ada")));
        assert_eq!(rows[0].get("born"), Some(&Value::from("1815-12-10")));
        assert_eq!(rows[1].get("name"), Some(&Value::Null));
        Ok(())
    }

    #[tokio::test]
    async fn test_describe_schema_uppercases_names() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .execute("CREATE TABLE users (id INTEGER, name VARCHAR)")
            .await?;

        let schema = connector.describe_schema("users").await?;
        assert_eq!(schema.names().collect::<Vec<_>>(), ["ID", "NAME"]);
        assert_eq!(schema.get("id").map(|c| c.data_type.as_str()), Some("INTEGER"));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_staging_overwrites_with_text_columns() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let first = StagedDataset::from_records(["ID", "NAME"], [["1", "A"], ["2", ""]])?;
        connector.write_staging("stg.users", &first).await?;
        let second = StagedDataset::from_records(["ID"], [["9"]])?;
        connector.write_staging("stg.users", &second).await?;

        let schema = connector.describe_schema("stg.users").await?;
        assert_eq!(schema.names().collect::<Vec<_>>(), ["ID"]);
        assert_eq!(schema.get("ID").map(|c| c.data_type.as_str()), Some("VARCHAR"));

        let rows = connector.execute("SELECT * FROM stg.users").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("ID"), Some(&Value::from("9")));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_string_is_staged_as_null() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let data = StagedDataset::from_records(["ID", "NAME"], [["1", ""]])?;
        connector.write_staging("stg.users", &data).await?;

        let rows = connector
            .execute("SELECT count(*) AS n FROM stg.users WHERE name IS NULL")
            .await?;
        assert_eq!(rows[0].get_u64("n"), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let err = connector
            .execute("SELECT * FROM non_existent_table")
            .await
            .unwrap_err();
        assert!(err.is_backend_error());
        Ok(())
    }
}
