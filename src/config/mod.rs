//! Configuration management for depaudit
//!
//! Typed configuration sections, their defaults and validation. Loading and
//! layering of the configuration sources lives in [`core`].

use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::package::PackageName;

pub mod core;
mod smart_load;


/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub dependencies: DependencyConfig,
    pub index: IndexConfig,
    pub checkout: CheckoutConfig,
    pub scan: ScanConfig,
}

/// Run-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Size of the admission gate
    pub concurrency: usize,

    /// Analyze only the first N candidates (0 = no limit)
    pub limit: usize,

    /// Parent directory of the per-package working trees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_root: Option<PathBuf>,
}

/// Log file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

/// The two dependency names compared by the selector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Build dependency every candidate declares
    pub devel: String,

    /// Build dependency candidates do not declare
    pub helper: String,
}

/// Package index query tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub program: String,
    pub repos: Vec<String>,
    pub arch: String,
    pub timeout_secs: u64,
}

/// Source checkout and prep tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub program: String,

    /// Arguments before the package name in the clone step
    pub clone_args: Vec<String>,

    /// Arguments of the prep step, run inside the cloned tree
    pub prep_args: Vec<String>,

    pub timeout_secs: u64,
}

/// Which implementation evaluates the scan rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    /// External grep binary
    Grep,
    /// In-process search
    Builtin,
}

/// Source tree search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub engine: SearchEngine,

    /// grep binary, used by the `grep` engine
    pub program: String,

    /// Importable module name of the helper
    pub module: String,

    /// Entry point imported by the most specific rule
    pub entry_point: String,

    /// File name globs searched
    pub include: Vec<String>,

    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            limit: 0,
            work_root: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("depaudit.log"),
            level: "info".to_string(),
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            devel: "python3-devel".to_string(),
            helper: "python3-setuptools".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            program: "repoquery".to_string(),
            repos: vec!["rawhide".to_string(), "rawhide-source".to_string()],
            arch: "src".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            program: "fedpkg".to_string(),
            clone_args: vec!["clone".to_string()],
            prep_args: vec!["prep".to_string()],
            timeout_secs: 1800,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            engine: SearchEngine::Grep,
            program: "grep".to_string(),
            module: "setuptools".to_string(),
            entry_point: "setup".to_string(),
            include: vec!["*.py".to_string()],
            timeout_secs: 300,
        }
    }
}

impl GeneralConfig {
    /// Configured work root, or `depaudit` under the system temp directory
    pub fn work_root(&self) -> PathBuf {
        self.work_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("depaudit"))
    }
}

impl AuditConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.general.concurrency == 0 {
            bail!("general.concurrency must be at least 1");
        }

        for (key, name) in [
            ("dependencies.devel", &self.dependencies.devel),
            ("dependencies.helper", &self.dependencies.helper),
        ] {
            if let Err(e) = PackageName::parse(name) {
                bail!("{key} is not a valid package name: {e}");
            }
        }
        if self.dependencies.devel == self.dependencies.helper {
            bail!("dependencies.devel and dependencies.helper must differ");
        }

        for (key, program) in [
            ("index.program", &self.index.program),
            ("checkout.program", &self.checkout.program),
            ("scan.program", &self.scan.program),
        ] {
            if program.trim().is_empty() {
                bail!("{key} cannot be empty");
            }
        }

        if !is_identifier(&self.scan.module) {
            bail!("scan.module '{}' is not a valid module name", self.scan.module);
        }
        if !is_identifier(&self.scan.entry_point) {
            bail!(
                "scan.entry_point '{}' is not a valid identifier",
                self.scan.entry_point
            );
        }
        if self.scan.include.is_empty() {
            bail!("scan.include needs at least one glob");
        }

        for (key, secs) in [
            ("index.timeout_secs", self.index.timeout_secs),
            ("checkout.timeout_secs", self.checkout.timeout_secs),
            ("scan.timeout_secs", self.scan.timeout_secs),
        ] {
            if secs == 0 {
                bail!("{key} cannot be 0");
            }
        }

        Ok(())
    }
}

/// Dotted identifier such as `setuptools` or `setuptools.command`
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
