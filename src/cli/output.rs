//! Styled terminal output
//!
//! Status messages, the progress bar and the final report. Tracing goes to
//! stderr and the log file; this is what the user reads.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::report::{Classification, Report};

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are always shown, even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Only shown with `-v`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn list_item(&self, item: &str) {
        println!("  • {}", item);
    }

    pub fn status_indicator(&self, status: &str, message: &str, is_success: bool) {
        let (icon, color) = if is_success {
            ("✓", style(status).green())
        } else {
            ("✗", style(status).red())
        };
        println!("{} {} {}", style(icon).bold(), color.bold(), message);
    }

    /// Progress bar on stderr; hidden in quiet mode
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(bar_style);
        pb.set_message(message.to_string());
        pb
    }

    /// Print the final report; shown even in quiet mode
    pub fn report(&self, report: &Report) {
        println!(
            "\n{} {}",
            style("Analyzed").bold(),
            style(format!("{} packages", report.len())).bold()
        );
        for classification in Classification::ALL {
            let members = report.bucket(classification);
            let count = style(members.len().to_string()).bold();
            let count = match classification {
                Classification::NoHelperUsage => count.green(),
                Classification::HelperUsageConfirmed => count.yellow(),
                Classification::HelperMentionOnly => count.cyan(),
                Classification::AnalysisFailed => count.red(),
            };
            println!("\n{} packages {}:", count, classification.label());
            for package in members {
                self.list_item(package.as_str());
            }
        }
    }
}
