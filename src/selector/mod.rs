//! Candidate selection
//!
//! Candidates are the source packages that build-require the devel package
//! but not the helper package. Two reverse-dependency queries go to the
//! package index and the helper result set is subtracted from the devel one.
//! A failing query aborts selection; partial output is never parsed.

mod repoquery;

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::package::{PackageName, PackageNameError, name_from_nevra};
use crate::process::ToolError;

pub use repoquery::Repoquery;

/// Candidate selection failure; always fatal for the run
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("package index query for '{dependency}' could not run: {source}")]
    Tool {
        dependency: String,
        #[source]
        source: ToolError,
    },

    #[error("package index query for '{dependency}' exited with {code}: {stderr}")]
    Status {
        dependency: String,
        code: String,
        stderr: String,
    },

    #[error("package index returned malformed entry '{token}'")]
    Malformed { token: String },

    #[error("package index returned unusable name: {0}")]
    InvalidName(#[from] PackageNameError),
}

/// A queryable package index
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Raw `<name>-<version>-<release>` tokens of source packages whose build
    /// requirements include `dependency`
    async fn what_requires(&self, dependency: &str) -> Result<Vec<String>, QueryError>;
}

/// Computes the candidate set from a [`PackageIndex`]
pub struct Selector<'a> {
    index: &'a dyn PackageIndex,
    devel: String,
    helper: String,
}

impl<'a> Selector<'a> {
    pub fn new(index: &'a dyn PackageIndex, devel: impl Into<String>, helper: impl Into<String>) -> Self {
        Self {
            index,
            devel: devel.into(),
            helper: helper.into(),
        }
    }

    /// Query both dependencies and return the normalized candidate names
    pub async fn select_candidates(&self) -> Result<BTreeSet<PackageName>, QueryError> {
        let with_devel = self.index.what_requires(&self.devel).await?;
        info!("{} source packages require {}", with_devel.len(), self.devel);

        let with_helper = self.index.what_requires(&self.helper).await?;
        info!("{} source packages require {}", with_helper.len(), self.helper);

        let candidates = candidates_from(&with_devel, &with_helper)?;
        info!(
            "{} candidates require {} without {}",
            candidates.len(),
            self.devel,
            self.helper
        );
        Ok(candidates)
    }
}

/// `with_devel − with_helper` over raw tokens, normalized to package names
///
/// The subtraction happens before normalization, so two builds of the same
/// package collapse into one candidate afterwards.
pub fn candidates_from(
    with_devel: &[String],
    with_helper: &[String],
) -> Result<BTreeSet<PackageName>, QueryError> {
    let helper_tokens: HashSet<&str> = clean_tokens(with_helper).collect();

    let mut candidates = BTreeSet::new();
    for token in clean_tokens(with_devel) {
        if helper_tokens.contains(token) {
            continue;
        }
        let name = name_from_nevra(token).ok_or_else(|| QueryError::Malformed {
            token: token.to_string(),
        })?;
        if candidates.insert(PackageName::parse(name)?) {
            debug!("Candidate {} (from {})", name, token);
        }
    }

    Ok(candidates)
}

fn clean_tokens(raw: &[String]) -> impl Iterator<Item = &str> {
    raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty())
}
