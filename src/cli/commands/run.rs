use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::{AnalysisArgs, analyze_and_report, select_candidates, with_limit};
use crate::cli::Output;
use crate::config::AuditConfig;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Analyze only the first N candidates
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl RunArgs {
    pub fn overrides(&self) -> Value {
        with_limit(self.analysis.overrides(), self.limit)
    }
}

pub async fn execute(config: &AuditConfig, output: &Output) -> Result<()> {
    output.header("Selecting candidates");
    output.verbose(&format!(
        "Packages requiring {} but not {}",
        config.dependencies.devel, config.dependencies.helper
    ));

    let candidates = select_candidates(config).await?;
    output.info(&format!("Found {} candidates", candidates.len()));

    analyze_and_report(&candidates, config, output).await?;
    Ok(())
}
