// refdq-core/src/domain/target/mod.rs

pub mod check;
pub mod configuration;

pub use check::{Check, CheckDefinition, CheckDocument, CheckRegistry, CheckResult};
pub use configuration::{
    ActionTrigger, ArgValue, CheckInvocation, PostWriteAction, Target, TargetDocument, TargetSelector,
    TargetSet,
};
