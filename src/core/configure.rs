//! Board configuration
//!
//! Loads the requested defconfig into the workspace before any other build
//! step. Saving the configuration skips this so the current `.config` is
//! what gets saved.

use crate::core::build_system::BuildSystem;
use crate::core::request::BuildRequest;
use crate::error::BuildError;

/// Step name reported when configuration fails
pub const CONFIGURE_STEP: &str = "configure";

/// What happened to the workspace configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// The defconfig was loaded
    Applied,
    /// The action preserves the current configuration
    Skipped,
}

/// Apply the request's defconfig unless the action saves the configuration
pub fn apply(build: &dyn BuildSystem, request: &BuildRequest) -> Result<ConfigOutcome, BuildError> {
    if !request.action().applies_configuration() {
        tracing::info!("Keeping current configuration for '{}'", request.action());
        return Ok(ConfigOutcome::Skipped);
    }

    tracing::info!("Applying {}", request.defconfig());
    build.invoke(CONFIGURE_STEP, request.defconfig())?;
    Ok(ConfigOutcome::Applied)
}
