// refdq-core/src/domain/impact.rs

use serde::Serialize;

use crate::domain::upload::UploadMode;

/// Row-level effect of applying an upload. Fields that do not apply to the
/// mode are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Impact {
    pub mode: UploadMode,
    pub inserted: Option<u64>,
    pub updated: Option<u64>,
    /// Target row count before the write.
    pub table_rows: u64,
    /// Merge: staged rows that differ from the target. Replace: all staged rows.
    pub upload_rows: u64,
    pub merge_rows_affected: Option<u64>,
}

impl Impact {
    pub fn merge(inserted: u64, updated: u64, table_rows: u64, upload_rows: u64) -> Self {
        Self {
            mode: UploadMode::Merge,
            inserted: Some(inserted),
            updated: Some(updated),
            table_rows,
            upload_rows,
            merge_rows_affected: Some(inserted + updated),
        }
    }

    pub fn replace(table_rows: u64, upload_rows: u64) -> Self {
        Self {
            mode: UploadMode::Replace,
            inserted: None,
            updated: None,
            table_rows,
            upload_rows,
            merge_rows_affected: None,
        }
    }

    /// A replace always changes the table (it may empty it). A merge changes
    /// it only when at least one row is new or different.
    pub fn has_changes(&self) -> bool {
        match self.mode {
            UploadMode::Merge => self.merge_rows_affected.unwrap_or(0) > 0,
            UploadMode::Replace => true,
        }
    }

    /// Rows removed by the write. Merges never delete.
    pub fn deleted(&self) -> u64 {
        match self.mode {
            UploadMode::Merge => 0,
            UploadMode::Replace => self.table_rows,
        }
    }
}
