use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{ScanRule, SearchError, SearchOutcome, SourceSearch};
use crate::config::ScanConfig;
use crate::process::ToolCommand;

/// External `grep -r -E` search
///
/// grep exit codes: 0 = a line matched, 1 = nothing matched, anything else
/// is an error.
#[derive(Debug, Clone)]
pub struct GrepSearch {
    program: String,
    include: Vec<String>,
    timeout: Duration,
}

impl GrepSearch {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            program: config.program.clone(),
            include: config.include.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn command(&self, rule: &ScanRule, root: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-r", "-q", "-E"])
            .args(self.include.iter().map(|glob| format!("--include={glob}")))
            .arg("-e")
            .arg(&rule.pattern)
            .arg("--")
            .arg(root)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl SourceSearch for GrepSearch {
    async fn search(&self, rule: &ScanRule, root: &Path) -> Result<SearchOutcome, SearchError> {
        let command = self.command(rule, root);
        let output = command.run().await?;

        match output.code {
            Some(0) => Ok(SearchOutcome::Match),
            Some(1) => Ok(SearchOutcome::NoMatch),
            _ => {
                warn!("'{}' failed:\n{}", command, output.combined());
                Err(SearchError::Failed {
                    code: output.code_display(),
                    stderr: output.stderr.trim().to_string(),
                })
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::report::Classification;
    use crate::scan::RuleSet;

    fn grep() -> GrepSearch {
        GrepSearch::new(&ScanConfig::default())
    }

    fn tree_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    async fn classify(dir: &Path) -> Result<Classification, SearchError> {
        RuleSet::for_module("setuptools", "setup")
            .evaluate(&grep(), dir)
            .await
    }

    #[tokio::test]
    async fn test_exact_import_is_confirmed_usage() {
        let dir = tree_with(&[
            ("foo-1.0/setup.py", "from setuptools import setup\n"),
            ("foo-1.0/README", "setuptools is mentioned here too\n"),
        ]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[tokio::test]
    async fn test_mention_in_python_comment_only() {
        let dir = tree_with(&[("foo-1.0/build.py", "# does not need setuptools anymore\nimport os\n")]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperMentionOnly);
    }

    #[tokio::test]
    async fn test_files_outside_include_globs_are_ignored() {
        let dir = tree_with(&[
            ("foo-1.0/foo.spec", "BuildRequires: python3-setuptools\n"),
            ("foo-1.0/main.py", "print('hello')\n"),
        ]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::NoHelperUsage);
    }

    #[tokio::test]
    async fn test_missing_root_is_a_search_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify(&dir.path().join("gone")).await.unwrap_err();
        assert!(matches!(err, SearchError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_grep_binary_is_a_tool_error() {
        let search = GrepSearch::new(&ScanConfig {
            program: "depaudit-missing-grep".to_string(),
            ..ScanConfig::default()
        });
        let dir = tree_with(&[("a.py", "import setuptools\n")]);
        let err = RuleSet::for_module("setuptools", "setup")
            .evaluate(&search, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Tool(_)));
    }
}
