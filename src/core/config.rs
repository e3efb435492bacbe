//! Project configuration
//!
//! Reads optional settings from `fwforge.toml` in the project directory.
//! Every field has a built-in default, so a missing file is not an error.
//! Command-line flags and environment variables take precedence over the
//! values loaded here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{defaults, urls};
use crate::error::ConfigError;
use crate::infra::download::TransportKind;

/// Placeholder replaced with the Buildroot version in URLs and paths
const VERSION_PLACEHOLDER: &str = "{version}";

/// Project configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Buildroot source settings
    #[serde(default)]
    pub buildroot: BuildrootConfig,

    /// Build dispatch settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Artifact names
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

/// Buildroot source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildrootConfig {
    /// Pinned release
    pub version: String,

    /// Archive URL, `{version}` is substituted
    pub url: String,

    /// Unpacked tree location relative to the project, `{version}` is substituted
    pub source_dir: String,

    /// Download transports in order of preference
    pub transports: Vec<TransportKind>,
}

impl Default for BuildrootConfig {
    fn default() -> Self {
        Self {
            version: defaults::BUILDROOT_VERSION.to_string(),
            url: urls::BUILDROOT_DOWNLOAD.to_string(),
            source_dir: defaults::BUILDROOT_SOURCE_DIR.to_string(),
            transports: vec![TransportKind::Curl, TransportKind::Wget],
        }
    }
}

impl BuildrootConfig {
    /// Download URL with the version substituted
    pub fn source_url(&self) -> String {
        self.url.replace(VERSION_PLACEHOLDER, &self.version)
    }

    /// Source tree location with the version substituted
    pub fn source_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.source_dir.replace(VERSION_PLACEHOLDER, &self.version))
    }
}

/// Build dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Board configuration to apply
    pub defconfig: String,

    /// Output directory relative to the project
    pub output_dir: String,

    /// Action used when none is given on the command line
    pub action: String,

    /// External project root passed to Buildroot as `BR2_EXTERNAL`
    pub external_root: Option<String>,

    /// Fast rebuild package candidates, first match wins
    pub candidates: Vec<String>,

    /// Search depth for `<name>.mk` files
    pub search_depth: usize,

    /// Compressed root filesystem target (best-effort)
    pub rootfs_target: String,

    /// Image target checked before the fallback
    pub image_target: String,

    /// Target used when the image target is not resolvable
    pub fallback_target: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            defconfig: defaults::DEFCONFIG.to_string(),
            output_dir: defaults::OUTPUT_DIR.to_string(),
            action: defaults::ACTION.to_string(),
            external_root: None,
            candidates: defaults::FAST_REBUILD_CANDIDATES
                .iter()
                .map(ToString::to_string)
                .collect(),
            search_depth: defaults::PACKAGE_SEARCH_DEPTH,
            rootfs_target: defaults::ROOTFS_TARGET.to_string(),
            image_target: defaults::IMAGE_TARGET.to_string(),
            fallback_target: defaults::FALLBACK_TARGET.to_string(),
        }
    }
}

/// Artifact names inside the images directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Boot partition image
    pub boot_image: String,

    /// Bootloader binary as built
    pub bootloader: String,

    /// Canonical bootloader name
    pub bootloader_name: String,

    /// Full flash image
    pub flash_image: String,

    /// Root filesystem image
    pub rootfs: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            boot_image: defaults::BOOT_IMAGE.to_string(),
            bootloader: defaults::BOOTLOADER.to_string(),
            bootloader_name: defaults::BOOTLOADER_NAME.to_string(),
            flash_image: defaults::FLASH_IMAGE.to_string(),
            rootfs: defaults::ROOTFS_IMAGE.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a specific path
    ///
    /// Returns defaults when the file does not exist and an error when it
    /// exists but cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
