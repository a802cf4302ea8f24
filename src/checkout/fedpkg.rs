use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CheckoutError, SourceCheckout, WorkingTree};
use crate::config::CheckoutConfig;
use crate::package::PackageName;
use crate::process::{ToolCommand, ToolOutput};

/// Clone-then-prep checkout driven by `fedpkg` (or a compatible tool)
///
/// `<program> <clone_args> <package>` runs in the work root and must create
/// `<work_root>/<package>`; `<program> <prep_args>` then runs inside it.
#[derive(Debug, Clone)]
pub struct FedpkgCheckout {
    program: String,
    clone_args: Vec<String>,
    prep_args: Vec<String>,
    timeout: Duration,
}

impl FedpkgCheckout {
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            program: config.program.clone(),
            clone_args: config.clone_args.clone(),
            prep_args: config.prep_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn step(&self, step: &'static str, command: ToolCommand) -> Result<ToolOutput, CheckoutError> {
        let output = command
            .run()
            .await
            .map_err(|source| CheckoutError::Tool { step, source })?;

        if !output.success() {
            warn!("'{}' exited with {}:\n{}", command, output.code_display(), output.combined());
            return Err(CheckoutError::StepFailed {
                step,
                code: output.code_display(),
                output: output.combined(),
            });
        }

        debug!("'{}' succeeded:\n{}", command, output.combined());
        Ok(output)
    }
}

#[async_trait]
impl SourceCheckout for FedpkgCheckout {
    async fn checkout(&self, package: &PackageName, tree: &WorkingTree) -> Result<(), CheckoutError> {
        tokio::fs::create_dir_all(tree.parent())
            .await
            .map_err(|source| CheckoutError::WorkRoot {
                path: tree.parent().to_path_buf(),
                source,
            })?;

        let clone = ToolCommand::new(&self.program)
            .args(&self.clone_args)
            .arg(package.as_str())
            .current_dir(tree.parent())
            .timeout(self.timeout);
        self.step("clone", clone).await?;

        let prep = ToolCommand::new(&self.program)
            .args(&self.prep_args)
            .current_dir(tree.path())
            .timeout(self.timeout);
        self.step("prep", prep).await?;

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Fake fedpkg: `clone` creates the package dir unless the name starts
    /// with `broken`, `prep` drops a source file into it
    fn fake_fedpkg(dir: &Path) -> String {
        let path = dir.join("fedpkg");
        let script = r#"#!/bin/sh
case "$1" in
  clone)
    case "$2" in broken*) echo "no such repo: $2" >&2; exit 1;; esac
    mkdir "$2" ;;
  prep)
    mkdir -p src && echo 'from setuptools import setup' > src/setup.py ;;
esac
"#;
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn checkout_with(program: String) -> FedpkgCheckout {
        FedpkgCheckout::new(&CheckoutConfig {
            program,
            ..CheckoutConfig::default()
        })
    }

    #[tokio::test]
    async fn test_clone_then_prep_inside_tree() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let package = PackageName::parse("python-foo").unwrap();
        let tree = WorkingTree::claim(&root.path().join("work"), &package).await;

        checkout_with(fake_fedpkg(bin.path()))
            .checkout(&package, &tree)
            .await
            .unwrap();

        let setup = std::fs::read_to_string(tree.path().join("src/setup.py")).unwrap();
        assert_eq!(setup.trim(), "from setuptools import setup");
        tree.cleanup().await;
    }

    #[tokio::test]
    async fn test_failed_clone_reports_step_and_output() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let package = PackageName::parse("broken-pkg").unwrap();
        let tree = WorkingTree::claim(root.path(), &package).await;

        let err = checkout_with(fake_fedpkg(bin.path()))
            .checkout(&package, &tree)
            .await
            .unwrap_err();
        match err {
            CheckoutError::StepFailed { step, code, output } => {
                assert_eq!(step, "clone");
                assert_eq!(code, "1");
                assert!(output.contains("no such repo: broken-pkg"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let package = PackageName::parse("pkg").unwrap();
        let tree = WorkingTree::claim(root.path(), &package).await;

        let err = checkout_with("depaudit-missing-fedpkg".to_string())
            .checkout(&package, &tree)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Tool { step: "clone", .. }));
    }
}
