//! Buildroot source provisioning
//!
//! Makes sure the pinned Buildroot tree exists on disk. An existing target
//! directory is trusted as-is; otherwise the release archive is downloaded
//! with the first available transport, unpacked, and its single top-level
//! directory moved into place.

use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::infra::download::{ProgressCallback, TransportKind};
use crate::infra::{archive, filesystem};

/// Where the pinned source comes from and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Release version
    pub version: String,
    /// Archive URL
    pub url: String,
    /// Final location of the unpacked tree
    pub target_dir: PathBuf,
}

/// Result of [`SourceProvisioner::ensure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The target directory already existed; nothing was done
    AlreadyPresent,
    /// The archive was fetched with the given transport and unpacked
    Fetched { transport: TransportKind },
}

type AvailabilityCheck = Box<dyn Fn(TransportKind) -> bool + Send + Sync>;

/// Fetches and unpacks the source tree at most once
pub struct SourceProvisioner {
    transports: Vec<TransportKind>,
    available: AvailabilityCheck,
}

impl SourceProvisioner {
    /// Provisioner trying `transports` in order
    pub fn new(transports: Vec<TransportKind>) -> Self {
        Self::with_availability(transports, TransportKind::is_available)
    }

    /// Provisioner with a custom availability check
    pub fn with_availability(
        transports: Vec<TransportKind>,
        available: impl Fn(TransportKind) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            transports,
            available: Box::new(available),
        }
    }

    /// First configured transport that is available
    pub fn select_transport(&self) -> Result<TransportKind, ProvisionError> {
        self.transports
            .iter()
            .copied()
            .find(|t| (self.available)(*t))
            .ok_or_else(|| ProvisionError::NoTransport {
                tried: self.transports.iter().map(ToString::to_string).collect(),
            })
    }

    /// Make sure `source.target_dir` exists, fetching it if needed
    pub async fn ensure(
        &self,
        source: &SourceSpec,
        progress: Option<ProgressCallback>,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if source.target_dir.exists() {
            tracing::info!(
                "Buildroot {} present at {}",
                source.version,
                source.target_dir.display()
            );
            return Ok(ProvisionOutcome::AlreadyPresent);
        }

        let transport = self.select_transport()?;
        let archive_path = sibling(&source.target_dir, ".download.tar.gz");
        let staging = sibling(&source.target_dir, ".staging");

        tracing::info!(
            "Fetching Buildroot {} from {} with {transport}",
            source.version,
            source.url
        );
        transport.fetch(&source.url, &archive_path, progress).await?;

        filesystem::remove_dir_all(&staging)?;
        archive::unpack_tar_gz(&archive_path, &staging).map_err(|e| {
            ProvisionError::Extraction {
                archive: archive_path.clone(),
                error: e.to_string(),
            }
        })?;

        let top_level = single_top_level_dir(&staging, &archive_path)?;
        filesystem::rename(&top_level, &source.target_dir)?;

        filesystem::remove_dir_all(&staging)?;
        filesystem::remove_file(&archive_path)?;

        tracing::info!("Buildroot unpacked to {}", source.target_dir.display());
        Ok(ProvisionOutcome::Fetched { transport })
    }
}

impl std::fmt::Debug for SourceProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceProvisioner")
            .field("transports", &self.transports)
            .finish_non_exhaustive()
    }
}

/// Path next to `target` with `suffix` appended to its file name
fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

/// The only directory directly inside `staging`
fn single_top_level_dir(staging: &Path, archive_path: &Path) -> Result<PathBuf, ProvisionError> {
    let entries = filesystem::list_dir(staging)?;
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Err(ProvisionError::UnexpectedLayout {
            archive: archive_path.to_path_buf(),
            found: entries.len(),
        }),
    }
}
