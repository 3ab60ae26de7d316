// refdq-core/src/domain/ports/config.rs

use std::collections::BTreeMap;

use crate::domain::error::DomainError;
use crate::domain::target::{CheckDocument, TargetDocument};

/// Where target and check definitions come from. Documents are returned raw;
/// required keys are checked when they are turned into the domain model.
pub trait ConfigSource: Send + Sync {
    /// Logical target name -> target document.
    fn list_targets(&self) -> Result<BTreeMap<String, TargetDocument>, DomainError>;

    /// Check type -> check definition document.
    fn list_check_definitions(&self) -> Result<BTreeMap<String, CheckDocument>, DomainError>;
}
