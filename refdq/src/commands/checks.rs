// refdq/src/commands/checks.rs
//
// USE CASE: Show the check registry.

use std::path::PathBuf;

use super::Project;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let project = Project::load(&project_dir)?;

    println!("🧪 Registered checks:");
    for (name, definition) in project.catalog.checks.iter() {
        let args = definition.required_arguments();
        if args.is_empty() {
            println!("   ➜ {}", name);
        } else {
            println!("   ➜ {} (requires: {})", name, args.join(", "));
        }
    }
    Ok(())
}
