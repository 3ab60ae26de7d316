// refdq-core/src/application/action.rs

use tracing::{info, instrument};

use crate::application::engine::execute_query;
use crate::domain::compiler::VariableScope;
use crate::domain::session::ActionReport;
use crate::domain::target::{PostWriteAction, Target};
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Renders and executes the target's post-write action. Actions without SQL
/// are recorded by name only; the driver decides what they mean.
#[instrument(skip_all, fields(target = %target.name, action = %action.name))]
pub async fn run_action(
    connector: &dyn Connector,
    target: &Target,
    action: &PostWriteAction,
) -> Result<ActionReport, RefdqError> {
    let Some(template) = &action.sql else {
        info!("Action '{}' has no statement", action.name);
        return Ok(ActionReport {
            name: action.name.clone(),
            statement: None,
            rows: Vec::new(),
        });
    };

    let scope = VariableScope::new()
        .with_general("table", target.target_table.as_str())
        .with_general("target_table", target.target_table.as_str())
        .with_general("primary_key", target.primary_key.as_str())
        .with_invocation(action.args.clone());
    let context = format!("action '{}' of target '{}'", action.name, target.name);
    let sql = template.render(&scope, &context)?;

    let rows = execute_query(connector, sql.as_str()).await?;
    info!("🚀 Action '{}' executed", action.name);
    Ok(ActionReport {
        name: action.name.clone(),
        statement: Some(sql.into_string()),
        rows,
    })
}
