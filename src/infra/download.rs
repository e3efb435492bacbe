//! Source archive download
//!
//! Fetches the Buildroot release archive with one of several interchangeable
//! transports: the `curl` or `wget` command-line tools, or an in-process
//! HTTP client with retry and exponential backoff.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::DownloadError;

/// Progress callback type for download progress reporting
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// A way of fetching bytes from a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// `curl` command-line tool
    Curl,
    /// `wget` command-line tool
    Wget,
    /// Built-in HTTP client
    Native,
}

impl TransportKind {
    /// Executable backing this transport, if any
    pub fn program(self) -> Option<&'static str> {
        match self {
            Self::Curl => Some("curl"),
            Self::Wget => Some("wget"),
            Self::Native => None,
        }
    }

    /// Whether the transport can be used on this system
    pub fn is_available(self) -> bool {
        self.program().map_or(true, |program| which::which(program).is_ok())
    }

    /// Fetch `url` into `dest`
    pub async fn fetch(
        self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<(), DownloadError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        match self {
            Self::Curl => {
                let mut cmd = tokio::process::Command::new("curl");
                cmd.args(["--fail", "--location", "--retry", "3", "--output"])
                    .arg(dest)
                    .arg(url);
                run_tool("curl", url, cmd).await
            }
            Self::Wget => {
                let mut cmd = tokio::process::Command::new("wget");
                cmd.arg("--tries=3").arg("-O").arg(dest).arg(url);
                run_tool("wget", url, cmd).await
            }
            Self::Native => {
                let bytes = DownloadManager::new().download(url, dest, progress).await?;
                tracing::debug!("Downloaded {bytes} bytes from {url}");
                Ok(())
            }
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Curl => write!(f, "curl"),
            Self::Wget => write!(f, "wget"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// Run an external download tool to completion
async fn run_tool(
    tool: &str,
    url: &str,
    mut cmd: tokio::process::Command,
) -> Result<(), DownloadError> {
    tracing::debug!("Running {tool} for {url}");
    let status = cmd
        .status()
        .await
        .map_err(|e| DownloadError::NetworkError {
            url: url.to_string(),
            error: format!("failed to run {tool}: {e}"),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(DownloadError::ToolFailed {
            tool: tool.to_string(),
            url: url.to_string(),
            status: status.code(),
        })
    }
}

/// Upper bound for the delay between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// In-process HTTP downloader
///
/// Each attempt streams the response body to `dest`. Failed attempts are
/// retried with a doubling delay; when every attempt fails the partial file
/// is removed.
#[derive(Debug, Clone)]
pub struct DownloadManager {
    client: reqwest::Client,
    attempts: u32,
    base_delay: Duration,
}

impl DownloadManager {
    /// Downloader with the default attempt count and a one second base delay
    pub fn new() -> Self {
        Self::with_config(defaults::MAX_DOWNLOAD_ATTEMPTS, Duration::from_secs(1))
    }

    /// Downloader making at most `attempts` attempts
    pub fn with_config(attempts: u32, base_delay: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(600))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Download `url` to `dest`, returning the number of bytes written
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, DownloadError> {
        let mut delay = self.base_delay;
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match self.download_once(url, dest, progress.as_ref()).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::warn!("Download attempt {attempt}/{} failed: {e}", self.attempts);
                    last_error = e.to_string();
                    if attempt < self.attempts {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }

        match tokio::fs::remove_file(dest).await {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                tracing::debug!("Could not remove partial download {}: {e}", dest.display());
            }
            _ => {}
        }

        Err(DownloadError::AttemptsExhausted {
            url: url.to_string(),
            attempts: self.attempts,
            last_error,
        })
    }

    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, DownloadError> {
        let network_err = |error: String| DownloadError::NetworkError {
            url: url.to_string(),
            error,
        };
        let io_err = |e: std::io::Error| DownloadError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(network_err(format!("HTTP {}", response.status())));
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = File::create(dest).await.map_err(io_err)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network_err(e.to_string()))?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
            if let Some(cb) = progress {
                cb(written, total);
            }
        }

        file.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}
