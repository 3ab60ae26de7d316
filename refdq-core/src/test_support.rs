// refdq-core/src/test_support.rs

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::row::Row;
use crate::domain::schema::TableSchema;
use crate::domain::upload::StagedDataset;
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Connector returning scripted rows. Queries are matched by substring, first
/// script wins; unmatched queries return no rows.
#[derive(Default)]
pub struct MockConnector {
    pub executed_queries: Arc<Mutex<Vec<String>>>,
    pub staged: Arc<Mutex<Vec<(String, StagedDataset)>>>,
    scripts: Vec<(String, Vec<Row>)>,
    schemas: Vec<(String, TableSchema)>,
    failing: Option<String>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.scripts.push((fragment.to_string(), rows));
        self
    }

    pub fn with_schema(mut self, table: &str, schema: TableSchema) -> Self {
        self.schemas.push((table.to_string(), schema));
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing = Some(fragment.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.executed_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn execute(&self, query: &str) -> Result<Vec<Row>, RefdqError> {
        self.executed_queries
            .lock()
            .unwrap()
            .push(query.to_string());
        if let Some(fragment) = &self.failing {
            if query.contains(fragment.as_str()) {
                return Err(duckdb::Error::InvalidParameterName(fragment.clone()).into());
            }
        }
        Ok(self
            .scripts
            .iter()
            .find(|(fragment, _)| query.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn describe_schema(&self, table: &str) -> Result<TableSchema, RefdqError> {
        Ok(self
            .schemas
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(table))
            .map(|(_, schema)| schema.clone())
            .unwrap_or_default())
    }

    async fn write_staging(&self, table: &str, data: &StagedDataset) -> Result<(), RefdqError> {
        self.staged
            .lock()
            .unwrap()
            .push((table.to_string(), data.clone()));
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}
