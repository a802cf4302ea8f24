//! # depaudit
//!
//! Audits a distribution's source packages for build dependencies that are
//! declared too narrowly: packages that build-require `python3-devel` but not
//! `python3-setuptools` are checked out, prepped and searched for setuptools
//! imports, and sorted into a four-bucket report.
//!
//! ```bash
//! # Full audit, 10 packages at a time
//! depaudit run --jobs 10
//!
//! # Only list the candidates
//! depaudit candidates
//!
//! # Audit a few packages by name
//! depaudit analyze python-foo python-bar
//! ```

pub mod checkout;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod package;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod scan;
pub mod selector;

pub use cli::{Cli, Output};
pub use config::AuditConfig;

/// Result type alias for depaudit operations
pub type Result<T> = anyhow::Result<T>;
