//! Upstream download locations

/// Buildroot release tarballs; `{version}` is substituted
pub const BUILDROOT_DOWNLOAD: &str = "https://buildroot.org/downloads/buildroot-{version}.tar.gz";
