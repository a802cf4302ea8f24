//! Command implementations for the depaudit CLI
//!
//! Each subcommand has its own module; the selection and analysis steps
//! shared by `run`, `candidates` and `analyze` live here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::checkout::FedpkgCheckout;
use crate::cli::Output;
use crate::config::{AuditConfig, SearchEngine};
use crate::error::AuditError;
use crate::package::PackageName;
use crate::pipeline::{Analyzer, Cancellation};
use crate::report::Report;
use crate::scan::{RuleSet, search_backend};
use crate::selector::{Repoquery, Selector};

pub mod analyze;
pub mod candidates;
pub mod config;
pub mod doctor;
pub mod run;

/// Flags shared by the commands that analyze packages
#[derive(Args, Debug, Default)]
pub struct AnalysisArgs {
    /// Number of packages analyzed at the same time
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Search implementation used on the prepared sources
    #[arg(long, value_enum)]
    pub engine: Option<SearchEngine>,

    /// Directory the working trees are created in
    #[arg(long, value_name = "DIR")]
    pub work_root: Option<PathBuf>,
}

impl AnalysisArgs {
    pub fn overrides(&self) -> Value {
        let mut general = Map::new();
        if let Some(jobs) = self.jobs {
            general.insert("concurrency".into(), json!(jobs));
        }
        if let Some(work_root) = &self.work_root {
            general.insert("work_root".into(), json!(work_root));
        }

        let mut scan = Map::new();
        if let Some(engine) = self.engine {
            scan.insert("engine".into(), json!(engine));
        }

        json!({ "general": general, "scan": scan })
    }
}

/// Add `general.limit` to an overrides document
pub(crate) fn with_limit(mut overrides: Value, limit: Option<usize>) -> Value {
    if let Some(limit) = limit {
        overrides["general"]["limit"] = json!(limit);
    }
    overrides
}

/// Query the package index and apply `general.limit`
pub(crate) async fn select_candidates(config: &AuditConfig) -> Result<Vec<PackageName>> {
    let index = Repoquery::new(&config.index);
    let selector = Selector::new(&index, &config.dependencies.devel, &config.dependencies.helper);

    let mut candidates: Vec<PackageName> = selector
        .select_candidates()
        .await
        .map_err(AuditError::from)?
        .into_iter()
        .collect();

    let limit = config.general.limit;
    if limit > 0 && candidates.len() > limit {
        info!("Limiting analysis to the first {} of {} candidates", limit, candidates.len());
        candidates.truncate(limit);
    }
    Ok(candidates)
}

/// Analyze `candidates`, print the report and log it
///
/// Ctrl-C cancels the outstanding analyses; their trees are removed, the
/// partial report is still printed and the run ends with
/// [`AuditError::Interrupted`].
pub(crate) async fn analyze_and_report(
    candidates: &[PackageName],
    config: &AuditConfig,
    output: &Output,
) -> Result<Report> {
    let work_root = config.general.work_root();
    let analyzer = Analyzer::new(
        Arc::new(FedpkgCheckout::new(&config.checkout)),
        search_backend(&config.scan)?,
        RuleSet::for_module(&config.scan.module, &config.scan.entry_point),
        work_root.clone(),
        config.general.concurrency,
    );
    let progress = output.progress_bar(candidates.len() as u64, "analyzing");
    let analyzer = analyzer.with_progress(progress.clone());

    output.info(&format!(
        "Analyzing {} packages in {}",
        candidates.len(),
        work_root.display()
    ));

    let (handle, cancel) = Cancellation::new();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping analyses and removing working trees");
            handle.cancel();
        }
    });

    let classifications = analyzer.analyze_all(candidates, &cancel).await;
    interrupt.abort();
    progress.finish_and_clear();

    let report = Report::aggregate(candidates, &classifications).context("Failed to build report")?;
    info!("Report:\n{}", report);
    output.report(&report);

    if cancel.is_cancelled() {
        return Err(AuditError::Interrupted.into());
    }
    Ok(report)
}
