use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use grep_regex::RegexMatcher;
use grep_searcher::{Searcher, sinks::Lossy};
use ignore::WalkBuilder;
use tracing::{debug, trace};

use super::{ScanRule, SearchError, SearchOutcome, SourceSearch};

/// In-process search with the ripgrep crates
///
/// Walks every file (hidden and git-ignored ones included, like `grep -r`)
/// whose name matches one of the include globs. Like `grep -q`, a match
/// anywhere wins; otherwise a directory or file that could not be read makes
/// the search fail instead of reporting no match.
#[derive(Debug, Clone)]
pub struct BuiltinSearch {
    include: GlobSet,
}

impl BuiltinSearch {
    pub fn new(include: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for glob in include {
            builder.add(Glob::new(glob).with_context(|| format!("Invalid include glob '{glob}'"))?);
        }
        Ok(Self {
            include: builder.build().context("Failed to build include globs")?,
        })
    }

    fn search_tree(include: &GlobSet, pattern: &str, root: &Path) -> Result<SearchOutcome, SearchError> {
        let matcher = RegexMatcher::new(pattern).map_err(|e| SearchError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        if !root.is_dir() {
            return Err(SearchError::Io {
                path: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build();
        let mut searcher = Searcher::new();
        let mut first_error: Option<SearchError> = None;

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Walk error under {}: {}", root.display(), e);
                    first_error.get_or_insert_with(|| SearchError::Io {
                        path: root.display().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let name_matches = entry
                .path()
                .file_name()
                .is_some_and(|name| include.is_match(Path::new(name)));
            if !name_matches {
                continue;
            }

            let mut found = false;
            let result = searcher.search_path(
                &matcher,
                entry.path(),
                Lossy(|_line_number, _line| {
                    found = true;
                    Ok(false)
                }),
            );
            if found {
                trace!("Match in {}", entry.path().display());
                return Ok(SearchOutcome::Match);
            }
            if let Err(e) = result {
                debug!("Failed to search {}: {}", entry.path().display(), e);
                first_error.get_or_insert_with(|| SearchError::Io {
                    path: entry.path().display().to_string(),
                    reason: e.to_string(),
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(SearchOutcome::NoMatch),
        }
    }
}

#[async_trait]
impl SourceSearch for BuiltinSearch {
    async fn search(&self, rule: &ScanRule, root: &Path) -> Result<SearchOutcome, SearchError> {
        let include = self.include.clone();
        let pattern = rule.pattern.clone();
        let root: PathBuf = root.to_path_buf();
        let path = root.display().to_string();

        tokio::task::spawn_blocking(move || Self::search_tree(&include, &pattern, &root))
            .await
            .map_err(|e| SearchError::Io {
                path,
                reason: format!("search task failed: {e}"),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Classification;
    use crate::scan::RuleSet;

    fn builtin() -> BuiltinSearch {
        BuiltinSearch::new(&["*.py".to_string()]).unwrap()
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
            .evaluate(&builtin(), dir)
            .await
    }

    #[tokio::test]
    async fn test_exact_import_is_confirmed_usage() {
        let dir = tree_with(&[("foo-1.0/setup.py", "from setuptools import setup\n")]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[tokio::test]
    async fn test_plain_import_is_confirmed_usage() {
        let dir = tree_with(&[("foo-1.0/pkg/build.py", "import sys\nimport setuptools\n")]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[tokio::test]
    async fn test_docstring_mention_only() {
        let dir = tree_with(&[(
            "foo-1.0/foo/__init__.py",
            "\"\"\"Port of the old setuptools entry points.\"\"\"\nimport os\n",
        )]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperMentionOnly);
    }

    #[tokio::test]
    async fn test_no_usage_and_hidden_dirs_are_searched() {
        let dir = tree_with(&[
            ("foo-1.0/main.py", "print('hi')\n"),
            ("foo-1.0/notes.txt", "import setuptools\n"),
        ]);
        assert_eq!(classify(dir.path()).await.unwrap(), Classification::NoHelperUsage);

        let hidden = tree_with(&[("foo-1.0/.tox/hook.py", "import setuptools\n")]);
        assert_eq!(classify(hidden.path()).await.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[tokio::test]
    async fn test_non_utf8_line_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("foo-1.0");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("setup.py"), b"from setuptools import setup  # caf\xe9\n").unwrap();

        assert_eq!(classify(dir.path()).await.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_directory_is_a_search_error() {
        use std::os::unix::fs::PermissionsExt;

        // SAFETY: geteuid has no preconditions
        if unsafe { libc::geteuid() } == 0 {
            // root reads through any permission bits
            return;
        }
        let dir = tree_with(&[
            ("foo-1.0/main.py", "import os\n"),
            ("foo-1.0/locked/hook.py", "import setuptools\n"),
        ]);
        let locked = dir.path().join("foo-1.0/locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let result = classify(dir.path()).await;
        std::fs::write(dir.path().join("foo-1.0/setup.py"), "import setuptools\n").unwrap();
        let with_match = classify(dir.path()).await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(SearchError::Io { .. })), "got {result:?}");
        // A match elsewhere still counts, as with grep -q
        assert_eq!(with_match.unwrap(), Classification::HelperUsageConfirmed);
    }

    #[tokio::test]
    async fn test_missing_root_is_a_search_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify(&dir.path().join("gone")).await.unwrap_err();
        assert!(matches!(err, SearchError::Io { .. }));
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        assert!(BuiltinSearch::new(&["[".to_string()]).is_err());
    }
}
