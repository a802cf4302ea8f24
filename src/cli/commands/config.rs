use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::config::AuditConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Toml)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Toml,
    Json,
}

pub fn execute(args: ConfigArgs, config: &AuditConfig) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => println!("{}", export(config, format)?),
    }
    Ok(())
}

fn export(config: &AuditConfig, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::Toml => toml::to_string_pretty(config)?,
        ExportFormat::Json => serde_json::to_string_pretty(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_export_reloads_to_same_values() {
        let config = AuditConfig::default();
        let text = export(&config, ExportFormat::Toml).unwrap();
        let parsed: AuditConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.general.concurrency, 10);
        assert_eq!(parsed.index.repos, config.index.repos);
        assert_eq!(parsed.scan.engine, config.scan.engine);
        assert!(text.contains("[checkout]"));
    }

    #[test]
    fn test_json_export() {
        let text = export(&AuditConfig::default(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["dependencies"]["helper"], "python3-setuptools");
        assert_eq!(value["scan"]["engine"], "grep");
    }
}
