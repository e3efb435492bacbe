//! Output formatting and progress indicators
//!
//! Status lines, the build summary, and the download progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

use crate::core::orchestrator::BuildOutcome;
use crate::infra::toolchain::OutputStream;

/// How results are shown to the user
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    /// Only errors are printed
    pub quiet: bool,
    /// The summary is printed as JSON
    pub json: bool,
}

impl OutputMode {
    /// Create an output mode from CLI flags
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Whether progress indicators should be drawn
    pub fn interactive(self) -> bool {
        !self.quiet && !self.json
    }

    /// Where build output and dry-run command lines go
    ///
    /// Stdout is reserved for the summary in JSON mode.
    pub fn build_output(self) -> OutputStream {
        if self.json {
            OutputStream::Stderr
        } else if self.quiet {
            OutputStream::Null
        } else {
            OutputStream::Stdout
        }
    }
}

/// Create a progress bar for downloads
pub fn create_download_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .map(|style| style.progress_chars("█▓▒░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Summary of a finished run
#[derive(Debug, Serialize)]
pub struct BuildSummary<'a> {
    /// Applied defconfig
    pub defconfig: &'a str,
    /// Workspace directory
    pub workspace: PathBuf,
    /// Whether commands were only printed
    pub dry_run: bool,
    /// What the orchestrator did
    #[serde(flatten)]
    pub outcome: &'a BuildOutcome,
}

/// Print the summary in the requested mode
pub fn print_summary(summary: &BuildSummary<'_>, mode: OutputMode) {
    if mode.json {
        println!("{}", serde_json::to_string_pretty(summary).unwrap_or_default());
        return;
    }
    if mode.quiet {
        return;
    }

    let outcome = summary.outcome;
    let verb = if summary.dry_run { "Dry run" } else { "Build" };
    println!(
        "{} {verb} complete: {} ({})",
        status::SUCCESS,
        outcome.action,
        summary.defconfig
    );
    println!("  Workspace: {}", summary.workspace.display());
    if let Some(package) = &outcome.package {
        println!("  Rebuilt package: {package}");
    }
    if let Some(target) = &outcome.image_target {
        println!("  Image target: {target}");
    }
    for step in &outcome.recovered {
        println!("  {} {}", status::WARNING, step.error);
    }
    if let Some(report) = &outcome.package_report {
        println!("  Bundle: {}", report.bundle.display());
        for digest in &report.digests {
            println!("  Checksum: {}", digest.display());
        }
    }
}

/// Print a fatal error to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        tracing::debug!("caused by: {cause}");
    }
}

/// Print an informational line unless quiet
pub fn info(mode: OutputMode, message: &str) {
    if mode.interactive() {
        println!("{} {message}", status::INFO);
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
