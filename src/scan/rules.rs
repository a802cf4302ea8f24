use std::path::Path;

use tracing::debug;

use super::{SearchError, SearchOutcome, SourceSearch};
use crate::report::Classification;

/// One pattern search and the classification a match yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRule {
    pub name: &'static str,
    /// Extended regular expression understood by both grep -E and `regex`
    pub pattern: String,
    pub outcome: Classification,
}

/// Rules evaluated top-to-bottom, first match wins
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ScanRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ScanRule>) -> Self {
        Self { rules }
    }

    /// Exact import, any import, bare mention of `module`
    pub fn for_module(module: &str, entry_point: &str) -> Self {
        let module = regex::escape(module);
        let entry_point = regex::escape(entry_point);
        let ws = "[[:space:]]";

        Self::new(vec![
            ScanRule {
                name: "exact-import",
                pattern: format!("from{ws}+{module}{ws}+import{ws}+\\(?{ws}*{entry_point}\\b"),
                outcome: Classification::HelperUsageConfirmed,
            },
            ScanRule {
                name: "any-import",
                pattern: format!(
                    "(^|[;:]){ws}*(import{ws}+([[:alnum:]_.]+{ws}*,{ws}*)*{module}\\b|from{ws}+{module}(\\.[[:alnum:]_.]+)?{ws}+import\\b)"
                ),
                outcome: Classification::HelperUsageConfirmed,
            },
            ScanRule {
                name: "mention",
                pattern: module,
                outcome: Classification::HelperMentionOnly,
            },
        ])
    }

    pub fn rules(&self) -> &[ScanRule] {
        &self.rules
    }

    /// Classify the tree under `root`
    ///
    /// Stops at the first rule that matches. A search failure aborts the
    /// evaluation instead of being read as "no match".
    pub async fn evaluate(&self, search: &dyn SourceSearch, root: &Path) -> Result<Classification, SearchError> {
        for rule in &self.rules {
            match search.search(rule, root).await? {
                SearchOutcome::Match => {
                    debug!("Rule '{}' matched in {}", rule.name, root.display());
                    return Ok(rule.outcome);
                }
                SearchOutcome::NoMatch => debug!("Rule '{}' found nothing", rule.name),
            }
        }
        Ok(Classification::NoHelperUsage)
    }
}
