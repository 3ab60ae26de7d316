// refdq-core/src/domain/upload.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Upsert on the primary key. Untouched target rows survive.
    #[default]
    Merge,
    /// Target contents are entirely replaced by the staged rows.
    Replace,
}

impl FromStr for UploadMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(UploadMode::Merge),
            "replace" => Ok(UploadMode::Replace),
            _ => Err(DomainError::InvalidUploadMode(s.to_string())),
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadMode::Merge => write!(f, "merge"),
            UploadMode::Replace => write!(f, "replace"),
        }
    }
}

/// Uploaded rows before they reach the backend.
///
/// Every value is kept as its raw text. An empty string is NULL; anything else is a
/// literal to be cast later against the target's column types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl StagedDataset {
    pub fn from_records<H, R, V>(headers: H, records: R) -> Result<Self, DomainError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut columns: Vec<String> = Vec::new();
        for header in headers {
            let name = header.as_ref().trim().to_uppercase();
            if columns.contains(&name) {
                return Err(DomainError::DuplicateColumn(name));
            }
            columns.push(name);
        }
        if columns.is_empty() {
            return Err(DomainError::EmptyUpload);
        }

        let mut rows = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let row: Vec<Option<String>> = record
                .into_iter()
                .map(|v| {
                    let raw = v.as_ref();
                    (!raw.is_empty()).then(|| raw.to_string())
                })
                .collect();
            if row.len() != columns.len() {
                return Err(DomainError::RaggedRow {
                    row: index + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `<temp_schema>.<last segment of target_table>`
pub fn staging_table_name(temp_schema: &str, target_table: &str) -> String {
    let leaf = target_table.rsplit('.').next().unwrap_or(target_table);
    format!("{temp_schema}.{leaf}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_mode_parsing() {
        assert_eq!("MERGE".parse::<UploadMode>().unwrap(), UploadMode::Merge);
        assert_eq!(" replace".parse::<UploadMode>().unwrap(), UploadMode::Replace);
        assert!(matches!(
            "append".parse::<UploadMode>(),
            Err(DomainError::InvalidUploadMode(m)) if m == "append"
        ));
    }

    #[test]
    fn test_empty_strings_become_null() {
        let data = StagedDataset::from_records(["id", "Name"], [["1", ""], ["2", "B"]]).unwrap();
        assert_eq!(data.columns(), ["ID", "NAME"]);
        assert_eq!(data.rows()[0], vec![Some("1".to_string()), None]);
        assert_eq!(data.rows()[1][1].as_deref(), Some("B"));
    }

    #[test]
    fn test_whitespace_is_a_literal() {
        let data = StagedDataset::from_records(["A"], [[" "]]).unwrap();
        assert_eq!(data.rows()[0][0].as_deref(), Some(" "));
    }

    #[test]
    fn test_duplicate_headers_are_case_insensitive() {
        let err = StagedDataset::from_records(["id", "ID"], Vec::<Vec<&str>>::new()).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateColumn(c) if c == "ID"));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = StagedDataset::from_records(["A", "B"], [vec!["1", "2"], vec!["3"]]).unwrap_err();
        assert!(matches!(err, DomainError::RaggedRow { row: 2, expected: 2, found: 1 }));
    }

    #[test]
    fn test_staging_table_uses_last_segment() {
        assert_eq!(staging_table_name("TMP", "REF.PK.NAMES"), "TMP.NAMES");
        assert_eq!(staging_table_name("TMP", "NAMES"), "TMP.NAMES");
    }
}
