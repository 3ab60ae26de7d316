// refdq-core/src/domain/row.rs

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// One result row returned by the backend: an ordered `name -> value` mapping.
///
/// Lookups are case-insensitive because backends disagree on the case of
/// unquoted aliases (Snowflake upper-cases them, DuckDB keeps them as written).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.cells.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Reads a count-like cell. Backends may hand counts back as numbers or as text.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_ignores_case() {
        let row = Row::new().with("INSERTED", 3).with("updated", 1);
        assert_eq!(row.get_u64("inserted"), Some(3));
        assert_eq!(row.get_u64("UPDATED"), Some(1));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_counts_as_text() {
        let row = Row::new().with("TABLE_ROWS", "42");
        assert_eq!(row.get_u64("table_rows"), Some(42));
    }

    #[test]
    fn test_serializes_in_column_order() {
        let row = Row::new().with("Z", 1).with("A", "x");
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"Z":1,"A":"x"}"#);
        assert_eq!(row.values().collect::<Vec<_>>(), vec![&json!(1), &json!("x")]);
    }
}
