use anyhow::{Result, bail};
use clap::Args;

use crate::cli::Output;
use crate::config::{AuditConfig, SearchEngine};

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

/// External programs this configuration needs, with their config keys
pub(crate) fn required_tools(config: &AuditConfig) -> Vec<(&'static str, &str)> {
    let mut tools = vec![
        ("index.program", config.index.program.as_str()),
        ("checkout.program", config.checkout.program.as_str()),
    ];
    if config.scan.engine == SearchEngine::Grep {
        tools.push(("scan.program", config.scan.program.as_str()));
    }
    tools
}

pub fn execute(config: &AuditConfig, output: &Output) -> Result<()> {
    output.header("Checking external tools");

    let mut missing = 0;
    for (key, program) in required_tools(config) {
        match which::which(program) {
            Ok(path) => output.status_indicator("found", &format!("{key}: {}", path.display()), true),
            Err(_) => {
                missing += 1;
                output.status_indicator("missing", &format!("{key}: '{program}' not found on PATH"), false);
            }
        }
    }

    if missing > 0 {
        bail!("{missing} required tool(s) missing");
    }
    output.success("All required tools are available");
    Ok(())
}
