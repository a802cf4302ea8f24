//! Source tree search
//!
//! A prepared working tree is classified by running [`ScanRule`]s through a
//! [`SourceSearch`] backend, most specific rule first. Two backends exist: the
//! external grep binary and an in-process searcher built on the ripgrep
//! crates.

mod builtin;
mod grep;
mod rules;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ScanConfig, SearchEngine};
use crate::process::ToolError;

pub use builtin::BuiltinSearch;
pub use grep::GrepSearch;
pub use rules::{RuleSet, ScanRule};

/// Result of a single rule search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Match,
    NoMatch,
}

/// The search itself failed; says nothing about whether the pattern occurs
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search tool could not run: {0}")]
    Tool(#[from] ToolError),

    #[error("search tool exited with {code}: {stderr}")]
    Failed { code: String, stderr: String },

    #[error("invalid search pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("cannot search {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Runs one rule against a directory tree
#[async_trait]
pub trait SourceSearch: Send + Sync {
    async fn search(&self, rule: &ScanRule, root: &Path) -> Result<SearchOutcome, SearchError>;
}

/// Backend selected by `scan.engine`
pub fn search_backend(config: &ScanConfig) -> anyhow::Result<Arc<dyn SourceSearch>> {
    Ok(match config.engine {
        SearchEngine::Grep => Arc::new(GrepSearch::new(config)),
        SearchEngine::Builtin => Arc::new(BuiltinSearch::new(&config.include)?),
    })
}
