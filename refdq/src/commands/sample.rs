// refdq/src/commands/sample.rs
//
// USE CASE: Look at the current content of a target table.

use anyhow::Context;
use std::path::PathBuf;

use refdq_core::application::target_sample;

use super::Project;
use super::display::print_rows;

pub async fn execute(project_dir: PathBuf, table: String, limit: Option<usize>) -> anyhow::Result<()> {
    let project = Project::load(&project_dir)?;
    let target = project
        .catalog
        .targets
        .by_table(&table)
        .context("Only configured target tables can be sampled")?;
    let limit = limit.unwrap_or(project.config.sample_rows);

    let connector = project.connect()?;
    let rows = target_sample(&connector, &target.target_table, limit).await?;

    println!("\n🔍 {} (first {} rows)", target.target_table, limit);
    if rows.is_empty() {
        println!("   (empty table)");
    } else {
        print_rows(&rows, limit);
    }
    Ok(())
}
