//! Command-line interface for depaudit
//!
//! Global flags, subcommand dispatch, configuration loading and logging
//! setup. The commands themselves live in [`commands`].

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::config::AuditConfig;

mod commands;
mod output;

pub use commands::AnalysisArgs;
pub use output::Output;

use commands::{analyze, candidates, config, doctor, run};

/// Find source packages that import a build helper they never declare
#[derive(Parser)]
#[command(
    name = "depaudit",
    author,
    version,
    about,
    long_about = "Selects source packages that build-require the devel package but not the \
                  helper package, checks each one out, prepares it and searches its sources \
                  for imports of the helper."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append log records to this file instead of `logging.file`
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select candidates, analyze them and print the report (default)
    Run(run::RunArgs),
    /// Print the candidate packages without analyzing them
    Candidates(candidates::CandidatesArgs),
    /// Analyze the named packages, skipping candidate selection
    Analyze(analyze::AnalyzeArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Check that the external tools can be found
    Doctor(doctor::DoctorArgs),
}

impl Commands {
    /// Partial configuration set by this command's flags
    fn overrides(&self) -> serde_json::Value {
        match self {
            Commands::Run(args) => args.overrides(),
            Commands::Candidates(args) => args.overrides(),
            Commands::Analyze(args) => args.analysis.overrides(),
            Commands::Config(_) | Commands::Doctor(_) => json!({}),
        }
    }

    /// Whether the command does audit work worth a log file
    fn writes_log(&self) -> bool {
        matches!(
            self,
            Commands::Run(_) | Commands::Candidates(_) | Commands::Analyze(_)
        )
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or_else(|| Commands::Run(run::RunArgs::default()));

        let mut overrides = command.overrides();
        if let Some(log_file) = &self.log_file {
            overrides["logging"] = json!({ "file": log_file });
        }

        let config = AuditConfig::load(self.config.as_deref(), Some(overrides))?;

        let log_file = command
            .writes_log()
            .then(|| (config.logging.file.as_path(), config.logging.level.as_str()));
        crate::logging::init(self.verbose, self.quiet, log_file)?;

        let output = Output::new(self.verbose > 0, self.quiet);

        match command {
            Commands::Run(_) => run::execute(&config, &output).await,
            Commands::Candidates(_) => candidates::execute(&config, &output).await,
            Commands::Analyze(args) => analyze::execute(args, &config, &output).await,
            Commands::Config(args) => config::execute(args, &config),
            Commands::Doctor(_) => doctor::execute(&config, &output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::parse_from([
            "depaudit", "run", "--jobs", "4", "--limit", "15", "--engine", "builtin", "--work-root", "/tmp/w",
        ]);
        let overrides = cli.command.unwrap().overrides();

        assert_eq!(overrides["general"]["concurrency"], 4);
        assert_eq!(overrides["general"]["limit"], 15);
        assert_eq!(overrides["general"]["work_root"], "/tmp/w");
        assert_eq!(overrides["scan"]["engine"], "builtin");
    }

    #[test]
    fn test_unset_flags_leave_config_alone() {
        let cli = Cli::parse_from(["depaudit", "analyze", "python-foo"]);
        let overrides = cli.command.unwrap().overrides();
        assert_eq!(overrides["general"], json!({}));
        assert_eq!(overrides["scan"], json!({}));
    }

    #[test]
    fn test_analyze_rejects_option_like_package() {
        assert!(Cli::try_parse_from(["depaudit", "analyze", "--", "-rf"]).is_err());
        assert!(Cli::try_parse_from(["depaudit", "analyze"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["depaudit", "-vv", "candidates", "--log-file", "/tmp/x.log"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/x.log")));
        assert!(matches!(cli.command, Some(Commands::Candidates(_))));
    }
}
