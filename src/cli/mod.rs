//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod build;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::config::defaults;
use build::BuildOptions;
use output::OutputMode;

/// fwforge - Buildroot firmware build driver
///
/// Applies a board configuration, runs the requested Buildroot action in a
/// per-configuration workspace, and bundles the resulting images.
#[derive(Parser, Debug)]
#[command(name = "fwforge")]
#[command(author, version, long_version = long_version(), about, long_about = None)]
pub struct Cli {
    /// Action to run: all, savedefconfig, pixelpilot_fast, or any Buildroot target
    #[arg(env = "FWFORGE_ACTION", value_name = "ACTION")]
    pub action: Option<String>,

    /// Output directory; each defconfig gets its own workspace inside it
    #[arg(short, long, env = "FWFORGE_OUTPUT", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Board configuration to apply
    #[arg(short, long, env = "FWFORGE_DEFCONFIG", value_name = "NAME")]
    pub defconfig: Option<String>,

    /// External project tree passed to Buildroot
    #[arg(long, env = "BR2_EXTERNAL", value_name = "DIR")]
    pub external: Option<PathBuf>,

    /// Project configuration file
    #[arg(short, long, default_value = defaults::CONFIG_FILE, value_name = "FILE")]
    pub config: PathBuf,

    /// Print build commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Output the build summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Version with the commit and build time embedded by `build.rs`
pub fn long_version() -> &'static str {
    static LONG_VERSION: OnceLock<String> = OnceLock::new();
    LONG_VERSION.get_or_init(|| {
        let sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown");
        let dirty = if option_env!("VERGEN_GIT_DIRTY") == Some("true") {
            " (dirty)"
        } else {
            ""
        };
        format!(
            "{}\ncommit: {sha}{dirty}\nbuilt: {}",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
        )
    })
}

impl Cli {
    /// Run the requested build
    pub async fn run(self) -> Result<()> {
        let project_dir =
            std::env::current_dir().context("Failed to determine the project directory")?;
        let options = BuildOptions {
            action: self.action,
            output: self.output,
            defconfig: self.defconfig,
            external: self.external,
            config: self.config,
            dry_run: self.dry_run,
            mode: OutputMode::new(self.quiet, self.json),
        };
        build::execute(&project_dir, options).await
    }
}
