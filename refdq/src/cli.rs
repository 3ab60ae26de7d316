// refdq/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use refdq_core::domain::upload::UploadMode;

#[derive(Parser)]
#[command(name = "refdq")]
#[command(about = "Reference data quality gateway: validate an upload before it touches the target table", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🛂 Stages a CSV file and runs schema, type, impact and data quality checks
    #[command(group(ArgGroup::new("destination").required(true).args(["target", "table"])))]
    Validate {
        /// CSV file to upload (header row required)
        #[arg(long, short)]
        file: PathBuf,

        /// Logical target name (file stem under tables/)
        #[arg(long)]
        target: Option<String>,

        /// Physical table name, resolved back to its target
        #[arg(long)]
        table: Option<String>,

        /// merge | replace
        #[arg(long, default_value = "merge")]
        mode: UploadMode,

        /// Continue when target columns are missing from the upload
        #[arg(long)]
        ignore_schema_errors: bool,

        /// Apply the upload when every check passes
        #[arg(long)]
        write: bool,

        /// Run the target's optional post-write action
        #[arg(long, requires = "write")]
        run_action: bool,

        /// Write the session log as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 📋 Lists target tables
    Targets {
        /// Only tables of this group
        #[arg(long, short)]
        group: Option<String>,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🗂️  Lists target groups
    Groups {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🔍 Shows the first rows of a target table
    Sample {
        #[arg(long, short)]
        table: String,

        /// Defaults to sample_rows from the project file
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧪 Lists registered check types and the arguments they require
    Checks {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_validate_defaults() -> Result<()> {
        let args = Cli::parse_from(["refdq", "validate", "--file", "up.csv", "--target", "names"]);
        match args.command {
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
                assert_eq!(file.to_string_lossy(), "up.csv");
                assert_eq!(target.as_deref(), Some("names"));
                assert_eq!(table, None);
                assert_eq!(mode, UploadMode::Merge);
                assert!(!ignore_schema_errors && !write && !run_action);
                assert_eq!(report, None);
                assert_eq!(project_dir.to_string_lossy(), ".");
                Ok(())
            }
            _ => bail!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_parse_validate_by_table_in_replace_mode() -> Result<()> {
        let args = Cli::parse_from([
            "refdq",
            "validate",
            "-f",
            "up.csv",
            "--table",
            "REFDATA.NAMES",
            "--mode",
            "REPLACE",
            "--write",
            "--run-action",
        ]);
        match args.command {
            Commands::Validate {
                table,
                mode,
                write,
                run_action,
                ..
            } => {
                assert_eq!(table.as_deref(), Some("REFDATA.NAMES"));
                assert_eq!(mode, UploadMode::Replace);
                assert!(write && run_action);
                Ok(())
            }
            _ => bail!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_validate_requires_exactly_one_destination() {
        assert!(Cli::try_parse_from(["refdq", "validate", "--file", "up.csv"]).is_err());
        assert!(
            Cli::try_parse_from([
                "refdq", "validate", "--file", "up.csv", "--target", "a", "--table", "b"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        let result = Cli::try_parse_from([
            "refdq", "validate", "--file", "up.csv", "--target", "a", "--mode", "append",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_run_action_requires_write() {
        let result = Cli::try_parse_from([
            "refdq",
            "validate",
            "--file",
            "up.csv",
            "--target",
            "a",
            "--run-action",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_sample() -> Result<()> {
        let args = Cli::parse_from(["refdq", "sample", "-t", "REFDATA.NAMES", "--limit", "5"]);
        match args.command {
            Commands::Sample { table, limit, .. } => {
                assert_eq!(table, "REFDATA.NAMES");
                assert_eq!(limit, Some(5));
                Ok(())
            }
            _ => bail!("Expected Sample command"),
        }
    }

    #[test]
    fn test_cli_parse_targets_group() -> Result<()> {
        let args = Cli::parse_from(["refdq", "targets", "--group", "geo"]);
        match args.command {
            Commands::Targets { group, .. } => {
                assert_eq!(group.as_deref(), Some("geo"));
                Ok(())
            }
            _ => bail!("Expected Targets command"),
        }
    }
}
