//! Build command implementation
//!
//! Merges flags, environment and `fwforge.toml` into a [`BuildRequest`],
//! provisions the Buildroot tree, and hands the request to the orchestrator.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::output::{self, BuildSummary, OutputMode};
use crate::core::config::ProjectConfig;
use crate::core::orchestrator::{BuildOrchestrator, ImageTargets};
use crate::core::packager::{ArtifactPackager, ArtifactSet};
use crate::core::provision::{ProvisionOutcome, SourceProvisioner, SourceSpec};
use crate::core::request::{Action, BuildRequest};
use crate::core::resolver::PackageResolver;
use crate::error::FwforgeError;
use crate::infra::download::ProgressCallback;
use crate::infra::toolchain::{DryRun, Toolchain};

/// Options collected from the command line
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Action name, `None` uses the configured default
    pub action: Option<String>,
    /// Output directory override
    pub output: Option<PathBuf>,
    /// Defconfig override
    pub defconfig: Option<String>,
    /// External tree override
    pub external: Option<PathBuf>,
    /// Project configuration file
    pub config: PathBuf,
    /// Print commands only
    pub dry_run: bool,
    /// Output mode
    pub mode: OutputMode,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// The build request
    pub request: BuildRequest,
    /// External project tree
    pub external_root: PathBuf,
}

/// Apply precedence: flag or environment first, then config file
pub fn resolve_settings(
    project_dir: &Path,
    config: &ProjectConfig,
    options: &BuildOptions,
) -> Result<ResolvedSettings, FwforgeError> {
    let action: Action = options
        .action
        .as_deref()
        .unwrap_or(&config.build.action)
        .parse()?;
    let defconfig = options
        .defconfig
        .as_deref()
        .unwrap_or(&config.build.defconfig);
    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| project_dir.join(&config.build.output_dir));

    let external_root = options
        .external
        .clone()
        .or_else(|| config.build.external_root.as_ref().map(PathBuf::from))
        .map_or_else(|| project_dir.to_path_buf(), |p| project_dir.join(p));

    Ok(ResolvedSettings {
        request: BuildRequest::new(output_dir, defconfig, action)?,
        external_root,
    })
}

/// Execute the build command
pub async fn execute(project_dir: &Path, options: BuildOptions) -> Result<()> {
    let config_path = project_dir.join(&options.config);
    let config = ProjectConfig::load_from_path(&config_path).map_err(FwforgeError::from)?;
    let settings = resolve_settings(project_dir, &config, &options)?;
    let request = &settings.request;

    tracing::info!(
        "Action '{}' for {} in {}",
        request.action(),
        request.defconfig(),
        request.workspace().display()
    );

    let source = SourceSpec {
        version: config.buildroot.version.clone(),
        url: config.buildroot.source_url(),
        target_dir: config.buildroot.source_dir(project_dir),
    };
    provision(&config, &source, &options).await?;

    let toolchain = Toolchain::new(&source.target_dir, &settings.external_root, request)
        .with_output(options.mode.build_output());
    let resolver = PackageResolver::new(config.build.candidates.clone(), config.build.search_depth);
    let targets = ImageTargets {
        rootfs: config.build.rootfs_target.clone(),
        image: config.build.image_target.clone(),
        fallback: config.build.fallback_target.clone(),
    };

    let outcome = if options.dry_run {
        let dry_run = DryRun::new(toolchain);
        BuildOrchestrator::new(&dry_run, &resolver, None, settings.external_root.clone())
            .with_targets(targets)
            .run(request)
            .map_err(FwforgeError::from)?
    } else {
        let packager = ArtifactPackager::new(ArtifactSet::from(&config.artifacts));
        BuildOrchestrator::new(
            &toolchain,
            &resolver,
            Some(&packager),
            settings.external_root.clone(),
        )
        .with_targets(targets)
        .run(request)
        .map_err(FwforgeError::from)?
    };

    output::print_summary(
        &BuildSummary {
            defconfig: request.defconfig(),
            workspace: request.workspace(),
            dry_run: options.dry_run,
            outcome: &outcome,
        },
        options.mode,
    );
    Ok(())
}

/// Make sure the Buildroot tree exists; a dry run only reports what it would fetch
async fn provision(
    config: &ProjectConfig,
    source: &SourceSpec,
    options: &BuildOptions,
) -> Result<()> {
    if options.dry_run {
        if !source.target_dir.exists() {
            output::info(
                options.mode,
                &format!(
                    "Would fetch Buildroot {} from {} into {}",
                    source.version,
                    source.url,
                    source.target_dir.display()
                ),
            );
        }
        return Ok(());
    }

    let provisioner = SourceProvisioner::new(config.buildroot.transports.clone());
    let bar = (options.mode.interactive() && !source.target_dir.exists())
        .then(|| output::create_download_bar(0));
    let progress = bar.clone().map(|pb| -> ProgressCallback {
        Box::new(move |downloaded, total| {
            if total > 0 {
                pb.set_length(total);
            }
            pb.set_position(downloaded);
        })
    });

    let result = provisioner.ensure(source, progress).await;
    if let Some(pb) = bar {
        pb.finish_and_clear();
    }

    if let ProvisionOutcome::Fetched { transport } = result.map_err(FwforgeError::from)? {
        output::info(
            options.mode,
            &format!("Fetched Buildroot {} with {transport}", source.version),
        );
    }
    Ok(())
}
