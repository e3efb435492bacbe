//! Error types for fwforge
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Render an optional process exit code for error messages
pub fn exit_status_label(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_string(),
    }
}

/// Build request errors
#[derive(Error, Debug)]
pub enum RequestError {
    /// Defconfig name is empty
    #[error("Defconfig name must not be empty")]
    EmptyDefconfig,

    /// Action name is empty
    #[error("Action name must not be empty")]
    EmptyAction,

    /// Output directory cannot be made absolute
    #[error("Cannot resolve output directory '{path}': {error}")]
    OutputDir { path: PathBuf, error: String },
}

/// Project configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// External download tool failed
    #[error("{tool} exited with {} while downloading '{url}'", exit_status_label(*status))]
    ToolFailed {
        tool: String,
        url: String,
        status: Option<i32>,
    },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Every attempt failed
    #[error("Download of '{url}' failed after {attempts} attempts: {last_error}")]
    AttemptsExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove a file or directory
    #[error("Failed to remove '{path}': {error}")]
    Remove { path: PathBuf, error: String },

    /// Failed to list a directory
    #[error("Failed to read directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },

    /// Failed to copy a file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to rename a file or directory
    #[error("Failed to rename '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },
}

/// Source provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// None of the configured transports is installed
    #[error(
        "No download transport available (tried: {}). Install curl or wget, or add \"native\" to [buildroot].transports",
        tried.join(", ")
    )]
    NoTransport { tried: Vec<String> },

    /// Download failed
    #[error("Failed to download Buildroot source: {0}")]
    Download(#[from] DownloadError),

    /// Archive could not be unpacked
    #[error("Failed to extract '{archive}': {error}")]
    Extraction { archive: PathBuf, error: String },

    /// Archive did not contain exactly one top-level directory
    #[error("Expected a single top-level directory in '{archive}', found {found}")]
    UnexpectedLayout { archive: PathBuf, found: usize },

    /// Filesystem error while moving the unpacked tree into place
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Delegated build-system command errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Command ran and returned a non-zero status
    #[error(
        "Step '{step}' failed: 'make {target}' returned {}",
        exit_status_label(*status)
    )]
    CommandFailed {
        step: String,
        target: String,
        status: Option<i32>,
    },

    /// Command could not be started
    #[error("Step '{step}' could not start 'make {target}': {error}")]
    Spawn {
        step: String,
        target: String,
        error: String,
    },
}

impl BuildError {
    /// Name of the step that failed
    pub fn step(&self) -> &str {
        match self {
            Self::CommandFailed { step, .. } | Self::Spawn { step, .. } => step,
        }
    }
}

/// Fast-rebuild package resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No candidate matched any strategy
    #[error(
        "Could not determine the package to rebuild: none of [{}] appears in '{config}' or as a <name>.mk file under '{external_root}'. \
         Check that BR2_EXTERNAL points at the project tree, or rebuild manually with 'make <package>-rebuild'",
        candidates.join(", ")
    )]
    NoMatch {
        candidates: Vec<String>,
        config: PathBuf,
        external_root: PathBuf,
    },

    /// Candidate name cannot be turned into a line pattern
    #[error("Invalid candidate package name '{candidate}': {error}")]
    InvalidCandidate { candidate: String, error: String },

    /// Failed to read the applied configuration
    #[error("Failed to read '{path}' while resolving packages: {error}")]
    Io { path: PathBuf, error: String },

    /// Failed to walk the external project tree
    #[error("Failed to search '{root}' for package files: {error}")]
    Walk { root: PathBuf, error: String },
}

/// Artifact packaging errors
#[derive(Error, Debug)]
pub enum PackageError {
    /// Required artifact is missing from the images directory
    #[error("Required artifact '{name}' not found in '{dir}'")]
    MissingArtifact { name: String, dir: PathBuf },

    /// Failed to read an artifact for hashing
    #[error("Failed to compute digest of '{path}': {error}")]
    Digest { path: PathBuf, error: String },

    /// Digest record is malformed
    #[error("Malformed digest file '{path}'")]
    MalformedDigest { path: PathBuf },

    /// Failed to write the bundle
    #[error("Failed to create bundle '{path}': {error}")]
    Archive { path: PathBuf, error: String },

    /// Filesystem error while copying artifacts
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Build orchestration errors
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Delegated command failed
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Package resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Packaging failed
    #[error("Packaging failed: {0}")]
    Package(#[from] PackageError),
}

/// Top-level fwforge error type
#[derive(Error, Debug)]
pub enum FwforgeError {
    /// Invalid build request
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provisioning error
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// Build error
    #[error("Build error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}
