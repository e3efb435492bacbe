//! Build request model
//!
//! A [`BuildRequest`] is created once from command-line input and passed
//! explicitly to every component. It never changes during an invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::RequestError;

/// Literal action name selecting the fast rebuild path
pub const FAST_REBUILD_ACTION: &str = "pixelpilot_fast";

/// Literal action name saving the current configuration
pub const SAVE_DEFCONFIG_ACTION: &str = "savedefconfig";

/// Literal action name for a full build
pub const ALL_ACTION: &str = "all";

/// Suffix stripped from defconfig names to obtain the board name
const DEFCONFIG_SUFFIX: &str = "_defconfig";

/// Workspace-relative path of the applied configuration
const CONFIG_FILE: &str = ".config";

/// Workspace-relative images directory
const IMAGES_DIR: &str = "images";

/// Requested action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Action {
    /// Full image build followed by packaging
    All,
    /// Persist the current configuration as a defconfig
    SaveDefconfig,
    /// Incremental rebuild of the video receiver package
    FastRebuild,
    /// Any other Buildroot target, passed through literally
    Named(String),
}

impl Action {
    /// Literal Buildroot target name for this action
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_ACTION,
            Self::SaveDefconfig => SAVE_DEFCONFIG_ACTION,
            Self::FastRebuild => FAST_REBUILD_ACTION,
            Self::Named(target) => target,
        }
    }

    /// Whether the defconfig must be applied before dispatch
    ///
    /// Saving the configuration must not clobber it first.
    pub fn applies_configuration(&self) -> bool {
        !matches!(self, Self::SaveDefconfig)
    }
}

impl FromStr for Action {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "" => return Err(RequestError::EmptyAction),
            ALL_ACTION => Self::All,
            SAVE_DEFCONFIG_ACTION => Self::SaveDefconfig,
            FAST_REBUILD_ACTION => Self::FastRebuild,
            other => Self::Named(other.to_string()),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

/// A single build invocation
#[derive(Debug, Clone)]
pub struct BuildRequest {
    output_dir: PathBuf,
    defconfig: String,
    action: Action,
}

impl BuildRequest {
    /// Create a request, making `output_dir` absolute against the current directory
    pub fn new(
        output_dir: impl Into<PathBuf>,
        defconfig: &str,
        action: Action,
    ) -> Result<Self, RequestError> {
        let defconfig = defconfig.trim();
        if defconfig.is_empty() {
            return Err(RequestError::EmptyDefconfig);
        }

        let output_dir = output_dir.into();
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            std::env::current_dir()
                .map_err(|e| RequestError::OutputDir {
                    path: output_dir.clone(),
                    error: e.to_string(),
                })?
                .join(output_dir)
        };

        Ok(Self {
            output_dir,
            defconfig: defconfig.to_string(),
            action,
        })
    }

    /// Output directory holding one workspace per defconfig
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Defconfig name
    pub fn defconfig(&self) -> &str {
        &self.defconfig
    }

    /// Requested action
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Per-configuration workspace (`output_dir/defconfig`)
    pub fn workspace(&self) -> PathBuf {
        self.output_dir.join(&self.defconfig)
    }

    /// Applied configuration file inside the workspace
    pub fn config_file(&self) -> PathBuf {
        self.workspace().join(CONFIG_FILE)
    }

    /// Directory the build writes images to
    pub fn images_dir(&self) -> PathBuf {
        self.workspace().join(IMAGES_DIR)
    }

    /// Board name derived from the defconfig
    pub fn board_name(&self) -> &str {
        board_name(&self.defconfig)
    }
}

/// Strip a trailing `_defconfig` suffix; names without it are returned unchanged
pub fn board_name(defconfig: &str) -> &str {
    defconfig.strip_suffix(DEFCONFIG_SUFFIX).unwrap_or(defconfig)
}
