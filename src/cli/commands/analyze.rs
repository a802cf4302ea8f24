use std::collections::HashSet;

use anyhow::Result;
use clap::Args;

use super::{AnalysisArgs, analyze_and_report};
use crate::cli::Output;
use crate::config::AuditConfig;
use crate::package::PackageName;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Source packages to analyze
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<PackageName>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

pub async fn execute(args: AnalyzeArgs, config: &AuditConfig, output: &Output) -> Result<()> {
    // Repeated names would share one working tree
    let mut seen = HashSet::new();
    let packages: Vec<PackageName> = args
        .packages
        .into_iter()
        .filter(|package| seen.insert(package.clone()))
        .collect();

    analyze_and_report(&packages, config, output).await?;
    Ok(())
}
