use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};
use tracing::info;

use super::{select_candidates, with_limit};
use crate::cli::Output;
use crate::config::AuditConfig;

#[derive(Args, Debug, Default)]
pub struct CandidatesArgs {
    /// Print only the first N candidates
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl CandidatesArgs {
    pub fn overrides(&self) -> Value {
        with_limit(json!({ "general": {} }), self.limit)
    }
}

/// One name per line on stdout, sorted
pub async fn execute(config: &AuditConfig, output: &Output) -> Result<()> {
    let candidates = select_candidates(config).await?;
    info!("Listing {} candidates", candidates.len());

    for package in &candidates {
        println!("{package}");
    }
    output.verbose(&format!("{} candidates", candidates.len()));
    Ok(())
}
