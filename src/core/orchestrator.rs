//! Build dispatch
//!
//! Runs exactly one of three paths per invocation:
//!
//! - **save config**: `savedefconfig` only, the workspace configuration is
//!   left as it is
//! - **fast rebuild**: clean, build and reinstall the resolved receiver
//!   package, finalize the target tree, regenerate the images, package
//! - **named target**: pass the target through; `all` is packaged afterward
//!
//! Every other path applies the defconfig first. Any required step that
//! fails aborts the run; best-effort steps log a warning and continue.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::build_system::{best_effort, BuildSystem, StepOutcome};
use crate::core::configure::{self, ConfigOutcome};
use crate::core::packager::{ArtifactPackager, PackageReport};
use crate::core::request::{Action, BuildRequest};
use crate::core::resolver::{PackageResolver, ResolveContext};
use crate::error::{BuildError, OrchestratorError};

/// Target names used by the fast rebuild path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTargets {
    /// Compressed root filesystem image (best-effort)
    pub rootfs: String,
    /// Most specific image target, used only when make resolves it
    pub image: String,
    /// Target used when the image target does not resolve
    pub fallback: String,
}

impl Default for ImageTargets {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            rootfs: defaults::ROOTFS_TARGET.to_string(),
            image: defaults::IMAGE_TARGET.to_string(),
            fallback: defaults::FALLBACK_TARGET.to_string(),
        }
    }
}

/// A best-effort step that failed
#[derive(Debug, Clone, Serialize)]
pub struct RecoveredStep {
    /// Step name
    pub step: String,
    /// Failure description
    pub error: String,
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    /// Action that ran
    pub action: Action,
    /// Whether the defconfig was applied
    pub configured: bool,
    /// Package rebuilt by the fast path
    pub package: Option<String>,
    /// Image target chosen by the target lookup
    pub image_target: Option<String>,
    /// Best-effort steps that failed
    pub recovered: Vec<RecoveredStep>,
    /// Packaging result
    pub package_report: Option<PackageReport>,
}

impl BuildOutcome {
    fn new(action: Action, configured: bool) -> Self {
        Self {
            action,
            configured,
            package: None,
            image_target: None,
            recovered: Vec::new(),
            package_report: None,
        }
    }

    fn record(&mut self, outcome: StepOutcome) {
        if let StepOutcome::Recovered(e) = outcome {
            self.recovered.push(RecoveredStep {
                step: e.step().to_string(),
                error: e.to_string(),
            });
        }
    }
}

/// Sequences build-system calls for one request
pub struct BuildOrchestrator<'a> {
    build: &'a dyn BuildSystem,
    resolver: &'a PackageResolver,
    packager: Option<&'a ArtifactPackager>,
    targets: ImageTargets,
    external_root: PathBuf,
}

impl<'a> BuildOrchestrator<'a> {
    /// Create an orchestrator
    ///
    /// With `packager` set to `None` the packaging step is skipped, as in a
    /// dry run where no images exist.
    pub fn new(
        build: &'a dyn BuildSystem,
        resolver: &'a PackageResolver,
        packager: Option<&'a ArtifactPackager>,
        external_root: PathBuf,
    ) -> Self {
        Self {
            build,
            resolver,
            packager,
            targets: ImageTargets::default(),
            external_root,
        }
    }

    /// Override the fast rebuild targets
    #[must_use]
    pub fn with_targets(mut self, targets: ImageTargets) -> Self {
        self.targets = targets;
        self
    }

    /// Run the request to completion or first fatal failure
    pub fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, OrchestratorError> {
        let configured = configure::apply(self.build, request)? == ConfigOutcome::Applied;
        let mut outcome = BuildOutcome::new(request.action().clone(), configured);

        match request.action() {
            Action::SaveDefconfig => {
                self.required("savedefconfig", request.action().as_str())?;
            }
            Action::FastRebuild => {
                self.fast_rebuild(request, &mut outcome)?;
                outcome.package_report = self.package(request)?;
            }
            Action::All => {
                self.required("build", request.action().as_str())?;
                outcome.package_report = self.package(request)?;
            }
            Action::Named(target) => {
                self.required("build", target)?;
            }
        }

        Ok(outcome)
    }

    fn fast_rebuild(
        &self,
        request: &BuildRequest,
        outcome: &mut BuildOutcome,
    ) -> Result<(), OrchestratorError> {
        let config_file = request.config_file();
        let package = self.resolver.resolve_required(&ResolveContext {
            config_file: &config_file,
            external_root: &self.external_root,
        })?;
        tracing::info!("Fast rebuild of '{package}'");

        self.required("dirclean", &format!("{package}-dirclean"))?;
        self.required("build", &package)?;
        self.required("reinstall", &format!("{package}-reinstall"))?;
        self.required("target-finalize", "target-finalize")?;

        outcome.record(best_effort(self.build, "rootfs", &self.targets.rootfs));
        outcome.record(best_effort(self.build, "legal-info", "legal-info"));

        let image_target = self.select_image_target();
        self.required("image", &image_target)?;

        outcome.package = Some(package);
        outcome.image_target = Some(image_target);
        Ok(())
    }

    /// The image target when make resolves it, otherwise the fallback
    fn select_image_target(&self) -> String {
        if self.build.try_resolve_target(&self.targets.image) {
            tracing::info!("Using image target '{}'", self.targets.image);
            self.targets.image.clone()
        } else {
            tracing::info!(
                "Image target '{}' not available, falling back to '{}'",
                self.targets.image,
                self.targets.fallback
            );
            self.targets.fallback.clone()
        }
    }

    fn required(&self, step: &str, target: &str) -> Result<(), BuildError> {
        self.build.invoke(step, target)
    }

    fn package(&self, request: &BuildRequest) -> Result<Option<PackageReport>, OrchestratorError> {
        let Some(packager) = self.packager else {
            tracing::info!("Skipping packaging");
            return Ok(None);
        };
        let report = packager.package(&request.images_dir(), request.defconfig())?;
        Ok(Some(report))
    }
}
