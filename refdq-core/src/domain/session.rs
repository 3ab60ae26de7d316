// refdq-core/src/domain/session.rs

// The validation session is an append-only log of stage records plus a cursor
// over the fixed state machine:
//
//   Staged -> SchemaChecked -> TypeChecked -> ImpactAssessed -> ChecksRun
//          -> ReadyToWrite -> Written -> ActionRun
//
// A stage always appends its record. When its gate fails the session is blocked
// in the state it reached; blocked is an outcome, not an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::impact::Impact;
use crate::domain::row::Row;
use crate::domain::schema::{SchemaMismatch, TableSchema};
use crate::domain::target::CheckResult;
use crate::domain::upload::UploadMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Staged,
    SchemaChecked,
    TypeChecked,
    ImpactAssessed,
    ChecksRun,
    ReadyToWrite,
    Written,
    ActionRun,
}

impl SessionState {
    pub fn successor(self) -> Option<SessionState> {
        use SessionState::*;
        match self {
            Staged => Some(SchemaChecked),
            SchemaChecked => Some(TypeChecked),
            TypeChecked => Some(ImpactAssessed),
            ImpactAssessed => Some(ChecksRun),
            ChecksRun => Some(ReadyToWrite),
            ReadyToWrite => Some(Written),
            Written => Some(ActionRun),
            ActionRun => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Written | SessionState::ActionRun)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Staged => "staged",
            SessionState::SchemaChecked => "schema checked",
            SessionState::TypeChecked => "type checked",
            SessionState::ImpactAssessed => "impact assessed",
            SessionState::ChecksRun => "checks run",
            SessionState::ReadyToWrite => "ready to write",
            SessionState::Written => "written",
            SessionState::ActionRun => "action run",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Target columns missing from the upload. Can be overridden.
    SchemaMismatch,
    /// The primary key column is missing from the upload. Never overridable.
    MissingPrimaryKey,
    TypeMismatch,
    /// A merge that would not change a single row.
    NoChanges,
    ChecksFailed,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BlockReason::SchemaMismatch => "target columns are missing from the upload",
            BlockReason::MissingPrimaryKey => "the primary key column is missing from the upload",
            BlockReason::TypeMismatch => "some values cannot be converted to the target types",
            BlockReason::NoChanges => "the upload does not change the target table",
            BlockReason::ChecksFailed => "data quality checks failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Active { state: SessionState },
    Blocked { at: SessionState, reason: BlockReason },
}

impl SessionStatus {
    pub fn state(&self) -> SessionState {
        match self {
            SessionStatus::Active { state } | SessionStatus::Blocked { at: state, .. } => *state,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, SessionStatus::Blocked { .. })
    }
}

// --- STAGE RECORDS ---

#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    pub stage_table: String,
    pub target_table: String,
    pub target_schema: TableSchema,
    pub staged_schema: TableSchema,
    pub staged_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    /// Target columns absent from the upload. Empty is the only pass.
    pub missing_columns: Vec<String>,
    /// Presence and type comparison, for display.
    pub mismatches: Vec<SchemaMismatch>,
    pub primary_key_missing: bool,
    pub overridden: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeReport {
    pub checked_columns: Vec<String>,
    /// `primary_key, column_name, value, expected_data_type` per offending value.
    pub violations: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
    pub all_passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub mode: UploadMode,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub name: String,
    pub statement: Option<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageRecord {
    Staged(StagingReport),
    SchemaChecked(SchemaReport),
    TypeChecked(TypeReport),
    ImpactAssessed(Impact),
    ChecksRun(CheckReport),
    Written(WriteReport),
    ActionRun(ActionReport),
}

/// Append-only history of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionLog {
    status: SessionStatus,
    records: Vec<StageRecord>,
}

impl SessionLog {
    pub fn start(staging: StagingReport) -> Self {
        Self {
            status: SessionStatus::Active {
                state: SessionState::Staged,
            },
            records: vec![StageRecord::Staged(staging)],
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Fails unless `next` directly follows the current state and the session
    /// is not blocked.
    pub fn ensure_can_enter(&self, next: SessionState) -> Result<(), DomainError> {
        match self.status {
            SessionStatus::Active { state } if state.successor() == Some(next) => Ok(()),
            SessionStatus::Active { state } => Err(DomainError::StageOutOfOrder {
                attempted: next.to_string(),
                current: state.to_string(),
            }),
            SessionStatus::Blocked { at, reason } => Err(DomainError::StageOutOfOrder {
                attempted: next.to_string(),
                current: format!("blocked at '{at}' ({reason})"),
            }),
        }
    }

    /// Appends the record of the stage that moved the session into `state`.
    pub fn append(&mut self, state: SessionState, record: StageRecord, blocked: Option<BlockReason>) {
        self.records.push(record);
        self.status = match blocked {
            Some(reason) => SessionStatus::Blocked { at: state, reason },
            None => SessionStatus::Active { state },
        };
    }

    /// Moves an active session to `state` without a new record.
    pub fn promote(&mut self, state: SessionState) {
        if let SessionStatus::Active { .. } = self.status {
            self.status = SessionStatus::Active { state };
        }
    }

    pub fn staging(&self) -> Option<&StagingReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::Staged(s) => Some(s),
            _ => None,
        })
    }

    pub fn schema(&self) -> Option<&SchemaReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::SchemaChecked(s) => Some(s),
            _ => None,
        })
    }

    pub fn types(&self) -> Option<&TypeReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::TypeChecked(t) => Some(t),
            _ => None,
        })
    }

    pub fn impact(&self) -> Option<&Impact> {
        self.records.iter().find_map(|r| match r {
            StageRecord::ImpactAssessed(i) => Some(i),
            _ => None,
        })
    }

    pub fn checks(&self) -> Option<&CheckReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::ChecksRun(c) => Some(c),
            _ => None,
        })
    }

    pub fn write(&self) -> Option<&WriteReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::Written(w) => Some(w),
            _ => None,
        })
    }

    pub fn action(&self) -> Option<&ActionReport> {
        self.records.iter().find_map(|r| match r {
            StageRecord::ActionRun(a) => Some(a),
            _ => None,
        })
    }
}

/// Serialisable snapshot of a finished (or blocked) session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub target: String,
    pub target_table: String,
    pub mode: UploadMode,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub log: SessionLog,
}
