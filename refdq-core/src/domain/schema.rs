// refdq-core/src/domain/schema.rs

use serde::Serialize;
use std::fmt;

/// One column as reported by the backend. Names are upper-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    pub name: String,
    pub data_type: String,
}

/// Ordered column -> type mapping of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: Vec<ColumnType>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, N, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: Into<String>,
    {
        let mut schema = Self::new();
        for (name, data_type) in pairs {
            schema.push(name.as_ref(), data_type);
        }
        schema
    }

    /// Appends a column. A name already present keeps its first position and type.
    pub fn push(&mut self, name: &str, data_type: impl Into<String>) {
        let name = name.trim().to_uppercase();
        if !self.contains(&name) {
            self.columns.push(ColumnType {
                name,
                data_type: data_type.into(),
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Target columns absent from the staged schema, in target order.
/// Extra staged columns are ignored: writes only ever touch target columns.
pub fn compare_columns(target: &TableSchema, staged: &TableSchema) -> Vec<String> {
    target
        .names()
        .filter(|name| !staged.contains(name))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    NotFound,
    DifferentDataType,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::NotFound => write!(f, "not found"),
            MismatchReason::DifferentDataType => write!(f, "different data type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaMismatch {
    pub column: String,
    pub target_type: String,
    pub staged_type: Option<String>,
    pub reason: MismatchReason,
}

/// Presence and type comparison. Informational only: staged columns are always
/// text, so type differences are expected and settled by the type check.
pub fn compare_schemas(target: &TableSchema, staged: &TableSchema) -> Vec<SchemaMismatch> {
    target
        .columns()
        .iter()
        .filter_map(|column| match staged.get(&column.name) {
            None => Some(SchemaMismatch {
                column: column.name.clone(),
                target_type: column.data_type.clone(),
                staged_type: None,
                reason: MismatchReason::NotFound,
            }),
            Some(s) if !s.data_type.eq_ignore_ascii_case(&column.data_type) => Some(SchemaMismatch {
                column: column.name.clone(),
                target_type: column.data_type.clone(),
                staged_type: Some(s.data_type.clone()),
                reason: MismatchReason::DifferentDataType,
            }),
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TableSchema {
        TableSchema::from_pairs([("ID", "INTEGER"), ("NAME", "VARCHAR"), ("AGE", "INTEGER")])
    }

    #[test]
    fn test_column_names_are_uppercased() {
        let schema = TableSchema::from_pairs([("id", "INTEGER"), (" Name ", "VARCHAR")]);
        assert_eq!(schema.names().collect::<Vec<_>>(), ["ID", "NAME"]);
        assert!(schema.contains("name"));
    }

    #[test]
    fn test_diff_is_empty_when_all_target_columns_present() {
        let staged = TableSchema::from_pairs([("age", "VARCHAR"), ("id", "VARCHAR"), ("name", "VARCHAR"), ("EXTRA", "VARCHAR")]);
        assert!(compare_columns(&target(), &staged).is_empty());
    }

    #[test]
    fn test_diff_preserves_target_order() {
        let staged = TableSchema::from_pairs([("NAME", "VARCHAR")]);
        assert_eq!(compare_columns(&target(), &staged), ["ID", "AGE"]);
    }

    #[test]
    fn test_full_comparison_reports_reason() {
        let staged = TableSchema::from_pairs([("ID", "VARCHAR"), ("NAME", "varchar")]);
        let mismatches = compare_schemas(&target(), &staged);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].column, "ID");
        assert_eq!(mismatches[0].reason.to_string(), "different data type");
        assert_eq!(mismatches[1].column, "AGE");
        assert_eq!(mismatches[1].reason.to_string(), "not found");
        assert_eq!(mismatches[1].staged_type, None);
    }
}
