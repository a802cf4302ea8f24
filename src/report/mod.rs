//! Report aggregation
//!
//! Folds the per-candidate classifications of a run into a mapping from
//! package to classification plus one bucket per classification.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::package::PackageName;

/// Final result of analyzing one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    NoHelperUsage,
    HelperUsageConfirmed,
    HelperMentionOnly,
    AnalysisFailed,
}

impl Classification {
    /// Report order
    pub const ALL: [Classification; 4] = [
        Classification::NoHelperUsage,
        Classification::HelperUsageConfirmed,
        Classification::HelperMentionOnly,
        Classification::AnalysisFailed,
    ];

    /// Bucket heading used in the summary
    pub fn label(self) -> &'static str {
        match self {
            Classification::NoHelperUsage => "does not use the helper",
            Classification::HelperUsageConfirmed => "uses the helper",
            Classification::HelperMentionOnly => "mentions the helper only incidentally",
            Classification::AnalysisFailed => "failed to analyze",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::NoHelperUsage => "no-helper-usage",
            Classification::HelperUsageConfirmed => "helper-usage-confirmed",
            Classification::HelperMentionOnly => "helper-mention-only",
            Classification::AnalysisFailed => "analysis-failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("{candidates} candidates but {classifications} classifications")]
    LengthMismatch {
        candidates: usize,
        classifications: usize,
    },

    #[error("candidate '{0}' appears more than once")]
    Duplicate(PackageName),
}

/// Mapping and buckets for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    classifications: BTreeMap<PackageName, Classification>,
    no_helper_usage: Vec<PackageName>,
    helper_usage_confirmed: Vec<PackageName>,
    helper_mention_only: Vec<PackageName>,
    analysis_failed: Vec<PackageName>,
}

impl Report {
    /// Build the report from parallel sequences
    ///
    /// `classifications[i]` belongs to `candidates[i]`. Buckets keep the
    /// candidate order.
    pub fn aggregate(candidates: &[PackageName], classifications: &[Classification]) -> Result<Self, ReportError> {
        if candidates.len() != classifications.len() {
            return Err(ReportError::LengthMismatch {
                candidates: candidates.len(),
                classifications: classifications.len(),
            });
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        let mut report = Report::default();

        for (package, &classification) in candidates.iter().zip(classifications) {
            if !seen.insert(package) {
                return Err(ReportError::Duplicate(package.clone()));
            }
            report.classifications.insert(package.clone(), classification);
            report.bucket_mut(classification).push(package.clone());
        }

        Ok(report)
    }

    fn bucket_mut(&mut self, classification: Classification) -> &mut Vec<PackageName> {
        match classification {
            Classification::NoHelperUsage => &mut self.no_helper_usage,
            Classification::HelperUsageConfirmed => &mut self.helper_usage_confirmed,
            Classification::HelperMentionOnly => &mut self.helper_mention_only,
            Classification::AnalysisFailed => &mut self.analysis_failed,
        }
    }

    pub fn bucket(&self, classification: Classification) -> &[PackageName] {
        match classification {
            Classification::NoHelperUsage => &self.no_helper_usage,
            Classification::HelperUsageConfirmed => &self.helper_usage_confirmed,
            Classification::HelperMentionOnly => &self.helper_mention_only,
            Classification::AnalysisFailed => &self.analysis_failed,
        }
    }

    pub fn classification_of(&self, package: &PackageName) -> Option<Classification> {
        self.classifications.get(package).copied()
    }

    pub fn len(&self) -> usize {
        self.classifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
    }
}

/// Plain-text summary, one block per bucket
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analyzed {} packages", self.len())?;
        for classification in Classification::ALL {
            let members = self.bucket(classification);
            writeln!(f, "{} packages {}:", members.len(), classification.label())?;
            for package in members {
                writeln!(f, "  {package}")?;
            }
        }
        Ok(())
    }
}
