//! Source checkout and per-package working trees
//!
//! A [`WorkingTree`] is the directory one analysis owns while it runs. It is
//! removed exactly once: by [`WorkingTree::cleanup`] on the normal path, or by
//! `Drop` when the analysis future is dropped before it got there.

mod fedpkg;

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::package::PackageName;
use crate::process::ToolError;

pub use fedpkg::FedpkgCheckout;

/// Checkout or prep step failure
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{step} step could not run: {source}")]
    Tool {
        step: &'static str,
        #[source]
        source: ToolError,
    },

    #[error("{step} step exited with {code}")]
    StepFailed {
        step: &'static str,
        code: String,
        /// Captured stdout and stderr
        output: String,
    },

    #[error("failed to prepare work root {}: {source}", path.display())]
    WorkRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Acquires a package's sources into its working tree and prepares them
#[async_trait]
pub trait SourceCheckout: Send + Sync {
    /// On success `tree.path()` holds the prepared sources
    async fn checkout(&self, package: &PackageName, tree: &WorkingTree) -> Result<(), CheckoutError>;
}

/// Ephemeral on-disk state of one analysis
#[derive(Debug)]
pub struct WorkingTree {
    path: PathBuf,
    removed: bool,
}

impl WorkingTree {
    /// Reserve `<work_root>/<package>`, removing anything an earlier run left there
    pub async fn claim(work_root: &Path, package: &PackageName) -> Self {
        let path = work_root.join(package.as_str());
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => warn!("Removed stale working tree {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove stale working tree {}: {}", path.display(), e),
        }
        Self { path, removed: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the tree lives in
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Remove the tree. Failures are logged, never returned.
    pub async fn cleanup(mut self) {
        self.removed = true;
        let result = tokio::fs::remove_dir_all(&self.path).await;
        log_removal(&self.path, result);
    }
}

impl Drop for WorkingTree {
    // Only reached when an analysis is cancelled, and the tree has to be gone
    // before the partial report is printed
    fn drop(&mut self) {
        if !self.removed {
            self.removed = true;
            log_removal(&self.path, std::fs::remove_dir_all(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!("Removed working tree {}", path.display()),
        // Checkout failed before creating anything
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Working tree {} was never created", path.display())
        }
        Err(e) => warn!("Failed to remove working tree {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str) -> PackageName {
        PackageName::parse(name).unwrap()
    }

    fn populate(tree: &WorkingTree) {
        std::fs::create_dir_all(tree.path().join("pkg-1.0/src")).unwrap();
        std::fs::write(tree.path().join("pkg-1.0/src/setup.py"), "import os\n").unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_removes_tree() {
        let root = tempfile::tempdir().unwrap();
        let tree = WorkingTree::claim(root.path(), &package("pkg")).await;
        assert_eq!(tree.path(), root.path().join("pkg"));
        assert_eq!(tree.parent(), root.path());
        populate(&tree);

        let path = tree.path().to_path_buf();
        tree.cleanup().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_missing_tree_is_quiet() {
        let root = tempfile::tempdir().unwrap();
        let tree = WorkingTree::claim(root.path(), &package("never-cloned")).await;
        tree.cleanup().await;
        assert!(root.path().exists());
    }

    #[tokio::test]
    async fn test_drop_removes_tree() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let tree = WorkingTree::claim(root.path(), &package("pkg")).await;
            populate(&tree);
            tree.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_claim_removes_stale_tree() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("pkg/leftover")).unwrap();

        let tree = WorkingTree::claim(root.path(), &package("pkg")).await;
        assert!(!tree.path().exists());
    }
}
