use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{info, warn};

use super::state::{AnalysisState, StateTracker};
use super::{BoundedProcessor, Cancellation};
use crate::checkout::{SourceCheckout, WorkingTree};
use crate::package::PackageName;
use crate::report::Classification;
use crate::scan::{RuleSet, SourceSearch};

/// Clones, scans and cleans up candidates under the admission gate
pub struct Analyzer {
    checkout: Arc<dyn SourceCheckout>,
    search: Arc<dyn SourceSearch>,
    rules: RuleSet,
    work_root: PathBuf,
    processor: BoundedProcessor,
    progress: Option<ProgressBar>,
}

impl Analyzer {
    pub fn new(
        checkout: Arc<dyn SourceCheckout>,
        search: Arc<dyn SourceSearch>,
        rules: RuleSet,
        work_root: PathBuf,
        concurrency: usize,
    ) -> Self {
        Self {
            checkout,
            search,
            rules,
            work_root,
            processor: BoundedProcessor::new(concurrency),
            progress: None,
        }
    }

    /// Tick `progress` once per finished candidate
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn processor(&self) -> &BoundedProcessor {
        &self.processor
    }

    /// Analyze one package
    ///
    /// Never fails: checkout and scan failures become
    /// [`Classification::AnalysisFailed`]. The working tree is removed on
    /// every path.
    pub async fn analyze(&self, package: &PackageName) -> Classification {
        let mut state = StateTracker::new(package);
        let tree = WorkingTree::claim(&self.work_root, package).await;

        state.advance(AnalysisState::Cloning);
        let classification = match self.checkout.checkout(package, &tree).await {
            Err(e) => {
                warn!("{}: checkout failed: {}", package, e);
                state.advance(AnalysisState::CloneFailed);
                Classification::AnalysisFailed
            }
            Ok(()) => {
                state.advance(AnalysisState::Prepared);
                state.advance(AnalysisState::Scanning);
                match self.rules.evaluate(self.search.as_ref(), tree.path()).await {
                    Ok(classification) => {
                        state.advance(AnalysisState::Classified);
                        classification
                    }
                    Err(e) => {
                        warn!("{}: scan failed: {}", package, e);
                        state.advance(AnalysisState::ScanFailed);
                        Classification::AnalysisFailed
                    }
                }
            }
        };

        tree.cleanup().await;
        state.advance(AnalysisState::CleanedUp);
        debug_assert!(state.state().is_terminal());

        info!("{}: {}", package, classification);
        classification
    }

    /// Analyze every candidate, `result[i]` belonging to `candidates[i]`
    ///
    /// Candidates that had not finished when `cancel` fired are reported as
    /// [`Classification::AnalysisFailed`].
    pub async fn analyze_all(&self, candidates: &[PackageName], cancel: &Cancellation) -> Vec<Classification> {
        info!(
            "Analyzing {} packages, {} at a time",
            candidates.len(),
            self.processor.limit()
        );

        let items: Vec<&PackageName> = candidates.iter().collect();
        let results = self
            .processor
            .process(
                items,
                |package| async move {
                    let classification = self.analyze(package).await;
                    if let Some(progress) = &self.progress {
                        progress.set_message(package.to_string());
                        progress.inc(1);
                    }
                    classification
                },
                cancel,
            )
            .await;

        results
            .into_iter()
            .zip(candidates)
            .map(|(result, package)| {
                result.unwrap_or_else(|| {
                    warn!("{}: analysis cancelled", package);
                    Classification::AnalysisFailed
                })
            })
            .collect()
    }
}
