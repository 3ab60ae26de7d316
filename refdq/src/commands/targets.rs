// refdq/src/commands/targets.rs
//
// USE CASE: Browse configured targets.

use std::path::PathBuf;

use super::Project;

pub fn execute_targets(project_dir: PathBuf, group: Option<String>) -> anyhow::Result<()> {
    let project = Project::load(&project_dir)?;
    let tables = project.catalog.targets.table_names(group.as_deref());

    match &group {
        Some(g) => println!("📋 Target tables in group '{}':", g),
        None => println!("📋 Target tables:"),
    }
    for table in tables {
        println!("   ➜ {}", table);
    }
    Ok(())
}

pub fn execute_groups(project_dir: PathBuf) -> anyhow::Result<()> {
    let project = Project::load(&project_dir)?;

    println!("🗂️  Target groups:");
    for group in project.catalog.targets.group_names() {
        println!("   ➜ {}", group);
    }
    Ok(())
}
