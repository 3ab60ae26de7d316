// refdq/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::validate::ValidateArgs;
use refdq_core::domain::target::TargetSelector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug refdq validate ... to see every generated statement
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: VALIDATE AN UPLOAD ---
        Commands::Validate {
            file,
            target,
            table,
            mode,
            ignore_schema_errors,
            write,
            run_action,
            report,
            project_dir,
        } => {
            let selector = match (target, table) {
                (Some(name), _) => TargetSelector::Name(name),
                (None, Some(table)) => TargetSelector::Table(table),
                (None, None) => anyhow::bail!("Either --target or --table is required"),
            };
            let args = ValidateArgs {
                project_dir,
                file,
                selector,
                mode,
                ignore_schema_errors,
                write,
                run_action,
                report,
            };
            if !commands::validate::execute(args).await? {
                std::process::exit(1);
            }
        }

        Commands::Targets { group, project_dir } => {
            commands::targets::execute_targets(project_dir, group)?;
        }

        Commands::Groups { project_dir } => {
            commands::targets::execute_groups(project_dir)?;
        }

        Commands::Sample {
            table,
            limit,
            project_dir,
        } => {
            commands::sample::execute(project_dir, table, limit).await?;
        }

        Commands::Checks { project_dir } => {
            commands::checks::execute(project_dir)?;
        }
    }

    Ok(())
}
