//! Logging setup
//!
//! Console output on stderr follows `-v`/`-q` (or `RUST_LOG`). The log file,
//! when enabled, gets plain timestamped lines at the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directive for the console layer
pub fn console_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info,ignore=warn,globset=warn",
        2 => "debug,ignore=warn,globset=warn",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// `log_file` is opened for appending and created if needed. Only the
/// first call in a process installs anything.
pub fn init(verbose: u8, quiet: bool, log_file: Option<(&Path, &str)>) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directive(verbose, quiet)));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = match log_file {
        Some((path, level)) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let filter =
                EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    // Already installed (tests, repeated init) is fine
    let _ = tracing_subscriber::registry().with(console).with(file).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(console_directive(0, false), "warn");
        assert!(console_directive(1, false).starts_with("info"));
        assert!(console_directive(2, false).starts_with("debug"));
        assert_eq!(console_directive(5, false), "trace");
        assert_eq!(console_directive(3, true), "error");
    }

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/depaudit.log");
        init(0, true, Some((&path, "info"))).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depaudit.log");
        assert!(init(0, true, Some((&path, "depaudit=loudest"))).is_err());
    }
}
