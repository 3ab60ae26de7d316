// refdq/src/commands/validate.rs
//
// USE CASE: Walk one upload through the validation session.

use anyhow::Context;
use std::path::PathBuf;

use refdq_core::application::{SessionContext, ValidationSession};
use refdq_core::domain::session::SessionStatus;
use refdq_core::domain::target::TargetSelector;
use refdq_core::domain::upload::UploadMode;
use refdq_core::infrastructure::adapters::csv::read_csv;
use refdq_core::infrastructure::compiler::jinja::JinjaRenderer;
use refdq_core::infrastructure::fs::write_report;

use super::Project;
use super::display::{mismatch_table, print_rows};

pub struct ValidateArgs {
    pub project_dir: PathBuf,
    pub file: PathBuf,
    pub selector: TargetSelector,
    pub mode: UploadMode,
    pub ignore_schema_errors: bool,
    pub write: bool,
    pub run_action: bool,
    pub report: Option<PathBuf>,
}

/// Returns `false` when the session ended blocked.
pub async fn execute(args: ValidateArgs) -> anyhow::Result<bool> {
    println!("⚙️  Loading configuration...");
    let project = Project::load(&args.project_dir)?;
    let target = project
        .catalog
        .targets
        .resolve(&args.selector)
        .context("Cannot resolve the upload target")?
        .clone();
    println!("   Target: {} ({})", target.name, target.target_table);

    let data = read_csv(&args.file).with_context(|| format!("Failed to read {:?}", args.file))?;
    let connector = project.connect()?;
    let renderer = JinjaRenderer::new();
    let ctx = SessionContext {
        connector: &connector,
        renderer: &renderer,
        registry: &project.catalog.checks,
        temp_schema: &project.config.temp_schema,
        dialect: project.config.dialect,
    };
    let cap = project.config.max_error_rows;

    // 1. STAGE
    let mut session = ValidationSession::stage(ctx, target, args.mode, &data).await?;
    if let Some(staging) = session.staging_report() {
        println!(
            "\n📥 Staged {} rows ({} columns) into {}",
            staging.staged_rows,
            staging.staged_schema.len(),
            staging.stage_table
        );
    }

    // 2. SCHEMA
    let status = session.check_schema(args.ignore_schema_errors).await?;
    if let Some(schema) = session.schema_report() {
        if schema.missing_columns.is_empty() {
            println!("\n✅ Schema: every target column is present");
        } else {
            println!("\n⚠️  Schema: columns missing from the upload: {}", schema.missing_columns.join(", "));
            println!("{}", mismatch_table(&schema.mismatches));
            if schema.overridden {
                println!("   Ignored on request; missing columns will be written as NULL.");
            }
        }
    }

    // 3. TYPES
    if !status.is_blocked() {
        session.check_types().await?;
        if let Some(types) = session.type_report() {
            if types.violations.is_empty() {
                println!("\n✅ Types: every value converts to its target type");
            } else {
                println!("\n❌ Types: {} values cannot be converted", types.violations.len());
                print_rows(&types.violations, cap);
            }
        }
    }

    // 4. IMPACT
    if !session.status().is_blocked() {
        session.assess_impact().await?;
        if let Some(impact) = session.impact() {
            match impact.mode {
                UploadMode::Merge => println!(
                    "\n📊 Impact (merge): insert {} rows, update {} rows ({} rows in table)",
                    impact.inserted.unwrap_or(0),
                    impact.updated.unwrap_or(0),
                    impact.table_rows
                ),
                UploadMode::Replace => println!(
                    "\n📊 Impact (replace): delete {} rows, insert {} rows",
                    impact.deleted(),
                    impact.upload_rows
                ),
            }
            if !impact.has_changes() {
                println!("ℹ️  No changes: the upload matches the target table.");
            }
        }
    }

    // 5. CHECKS
    if !session.status().is_blocked() {
        session.run_checks().await?;
        if let Some(checks) = session.check_report() {
            println!("\n🧪 Data quality checks");
            for result in &checks.results {
                let mark = if result.passed { "✅" } else { "❌" };
                println!("{} {}", mark, result.check_type);
                for line in result.description.lines() {
                    println!("   {}", line);
                }
                if !result.passed {
                    print_rows(&result.rows, cap);
                }
            }
        }
    }

    // 6. WRITE
    if session.is_ready_to_write() {
        if args.write {
            session.write().await?;
            println!("\n💾 Upload written to {}", session.target().target_table);
            if session.run_action(args.run_action).await? {
                if let Some(action) = session.log().action() {
                    println!("🚀 Action '{}' executed", action.name);
                }
            }
        } else {
            println!("\n✅ Ready to write. Re-run with --write to apply the upload.");
        }
    }

    if let Some(path) = &args.report {
        write_report(path, &session.report())?;
        println!("📝 Report written to {}", path.display());
    }

    match session.status() {
        SessionStatus::Blocked { at, reason } => {
            eprintln!("\n⛔ Blocked after '{}': {}", at, reason);
            Ok(false)
        }
        SessionStatus::Active { .. } => Ok(true),
    }
}
