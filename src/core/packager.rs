//! Artifact packaging
//!
//! Turns the images directory of a finished build into a distributable
//! bundle: board-prefixed copies of every produced image, MD5 digest records
//! in `md5sum(1)` format, and a `<board>.tar.gz` holding the root filesystem,
//! the bootloader and their digests.
//!
//! Every path is resolved against the images directory. The process working
//! directory is never changed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::ArtifactConfig;
use crate::core::request::board_name;
use crate::error::PackageError;
use crate::infra::{archive, filesystem};

/// Extension of digest records
const DIGEST_EXTENSION: &str = "md5sum";

/// Names of the images a build produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Boot partition image
    pub boot_image: String,
    /// Bootloader binary as built
    pub bootloader: String,
    /// Canonical bootloader name used in the bundle
    pub bootloader_name: String,
    /// Full flash image
    pub flash_image: String,
    /// Root filesystem image
    pub rootfs: String,
}

impl ArtifactSet {
    /// Artifacts copied under board-prefixed names, in order
    ///
    /// Not every board produces all of them.
    pub fn expected(&self) -> [&str; 4] {
        [
            self.boot_image.as_str(),
            self.bootloader.as_str(),
            self.flash_image.as_str(),
            self.rootfs.as_str(),
        ]
    }
}

impl From<&ArtifactConfig> for ArtifactSet {
    fn from(config: &ArtifactConfig) -> Self {
        Self {
            boot_image: config.boot_image.clone(),
            bootloader: config.bootloader.clone(),
            bootloader_name: config.bootloader_name.clone(),
            flash_image: config.flash_image.clone(),
            rootfs: config.rootfs.clone(),
        }
    }
}

impl Default for ArtifactSet {
    fn default() -> Self {
        Self::from(&ArtifactConfig::default())
    }
}

/// Files written by a packaging run
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    /// The compressed bundle
    pub bundle: PathBuf,
    /// Board-prefixed copies
    pub copies: Vec<PathBuf>,
    /// Digest records
    pub digests: Vec<PathBuf>,
}

/// Packages build outputs
#[derive(Debug, Clone, Default)]
pub struct ArtifactPackager {
    artifacts: ArtifactSet,
}

impl ArtifactPackager {
    /// Create a packager for the given artifact names
    pub fn new(artifacts: ArtifactSet) -> Self {
        Self { artifacts }
    }

    /// Artifact names this packager expects
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Package the contents of `images_dir` for `defconfig`
    pub fn package(
        &self,
        images_dir: &Path,
        defconfig: &str,
    ) -> Result<PackageReport, PackageError> {
        let board = board_name(defconfig);
        let set = &self.artifacts;
        tracing::info!("Packaging artifacts for {board} in {}", images_dir.display());

        let bootloader = require(images_dir, &set.bootloader)?;
        let rootfs = require(images_dir, &set.rootfs)?;

        let canonical_bootloader = images_dir.join(&set.bootloader_name);
        if bootloader != canonical_bootloader {
            filesystem::copy_file(&bootloader, &canonical_bootloader)?;
        }

        let mut copies = Vec::new();
        for name in set.expected() {
            let source = images_dir.join(name);
            if !source.is_file() {
                tracing::debug!("Skipping absent artifact {name}");
                continue;
            }
            let target = images_dir.join(format!("{board}-{name}"));
            filesystem::copy_file(&source, &target)?;
            copies.push(target);
        }

        let digests = vec![
            write_digest_file(&rootfs)?,
            write_digest_file(&canonical_bootloader)?,
        ];

        let rootfs_digest = digest_file_name(&set.rootfs);
        let bootloader_digest = digest_file_name(&set.bootloader_name);
        let members = [
            set.rootfs.as_str(),
            set.bootloader_name.as_str(),
            rootfs_digest.as_str(),
            bootloader_digest.as_str(),
        ];

        let bundle = images_dir.join(format!("{board}.tar.gz"));
        archive::create_tar_gz(&bundle, images_dir, &members).map_err(|e| {
            PackageError::Archive {
                path: bundle.clone(),
                error: e.to_string(),
            }
        })?;

        tracing::info!("Created bundle {}", bundle.display());
        Ok(PackageReport {
            bundle,
            copies,
            digests,
        })
    }
}

/// Path of `name` in `dir`, failing if it is not a file
fn require(dir: &Path, name: &str) -> Result<PathBuf, PackageError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(PackageError::MissingArtifact {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

/// Name of the digest record for `name`
fn digest_file_name(name: &str) -> String {
    format!("{name}.{DIGEST_EXTENSION}")
}

/// Compute the MD5 digest of a file as lowercase hex
pub fn compute_md5(path: &Path) -> Result<String, PackageError> {
    let digest_err = |e: std::io::Error| PackageError::Digest {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let mut reader = BufReader::new(File::open(path).map_err(digest_err)?);
    let mut context = md5::Context::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer).map_err(digest_err)?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }
    Ok(format!("{:x}", context.compute()))
}

/// Write `<file>.md5sum` next to `path` and return its location
pub fn write_digest_file(path: &Path) -> Result<PathBuf, PackageError> {
    let digest = compute_md5(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let record = path.with_file_name(digest_file_name(&name));
    filesystem::write_file(&record, &format!("{digest}  {name}\n"))?;
    Ok(record)
}

/// Check a digest record against the file it names
///
/// The named file is looked up next to the record.
pub fn verify_digest_file(record: &Path) -> Result<bool, PackageError> {
    let content = std::fs::read_to_string(record).map_err(|e| PackageError::Digest {
        path: record.to_path_buf(),
        error: e.to_string(),
    })?;

    let malformed = || PackageError::MalformedDigest {
        path: record.to_path_buf(),
    };
    let (expected, name) = content
        .lines()
        .next()
        .and_then(|line| line.split_once("  "))
        .ok_or_else(malformed)?;
    if expected.len() != 32 || name.is_empty() {
        return Err(malformed());
    }

    let actual = compute_md5(&record.with_file_name(name))?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::archive::list_tar_gz;
    use crate::test_utils::generators::defconfig_name;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn images_with(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).unwrap();
        }
        temp
    }

    fn full_images() -> TempDir {
        images_with(&[
            ("boot.vfat", "boot"),
            ("u-boot-rockchip.bin", "uboot"),
            ("sdcard.img", "sdcard"),
            ("rootfs.squashfs", "rootfs"),
        ])
    }

    #[test]
    fn test_compute_md5_known_value() {
        let temp = images_with(&[("f", "hello world")]);
        assert_eq!(
            compute_md5(&temp.path().join("f")).unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_package_full_set() {
        let images = full_images();
        let report = ArtifactPackager::default()
            .package(images.path(), "radxa_defconfig")
            .unwrap();

        assert_eq!(report.bundle, images.path().join("radxa.tar.gz"));
        assert!(images.path().join("u-boot.bin").is_file());
        assert_eq!(
            report.copies,
            vec![
                images.path().join("radxa-boot.vfat"),
                images.path().join("radxa-u-boot-rockchip.bin"),
                images.path().join("radxa-sdcard.img"),
                images.path().join("radxa-rootfs.squashfs"),
            ]
        );
        assert_eq!(
            list_tar_gz(&report.bundle).unwrap(),
            vec![
                "rootfs.squashfs",
                "u-boot.bin",
                "rootfs.squashfs.md5sum",
                "u-boot.bin.md5sum",
            ]
        );
    }

    #[test]
    fn test_sources_left_untouched() {
        let images = full_images();
        ArtifactPackager::default()
            .package(images.path(), "radxa_defconfig")
            .unwrap();
        assert_eq!(
            std::fs::read(images.path().join("u-boot-rockchip.bin")).unwrap(),
            b"uboot"
        );
        assert_eq!(
            std::fs::read(images.path().join("rootfs.squashfs")).unwrap(),
            b"rootfs"
        );
    }

    #[test]
    fn test_optional_artifacts_skipped() {
        let images = images_with(&[
            ("u-boot-rockchip.bin", "uboot"),
            ("rootfs.squashfs", "rootfs"),
        ]);
        let report = ArtifactPackager::default()
            .package(images.path(), "board")
            .unwrap();
        assert_eq!(report.copies.len(), 2);
        assert!(!images.path().join("board-sdcard.img").exists());
        assert_eq!(report.bundle, images.path().join("board.tar.gz"));
    }

    #[test]
    fn test_missing_bootloader_is_error() {
        let images = images_with(&[("rootfs.squashfs", "rootfs")]);
        let err = ArtifactPackager::default()
            .package(images.path(), "board_defconfig")
            .unwrap_err();
        match err {
            PackageError::MissingArtifact { name, .. } => assert_eq!(name, "u-boot-rockchip.bin"),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_rootfs_is_error() {
        let images = images_with(&[("u-boot-rockchip.bin", "uboot")]);
        let err = ArtifactPackager::default()
            .package(images.path(), "board_defconfig")
            .unwrap_err();
        match err {
            PackageError::MissingArtifact { name, .. } => assert_eq!(name, "rootfs.squashfs"),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_rootfs_writes_nothing() {
        let images = images_with(&[
            ("u-boot-rockchip.bin", "uboot"),
            ("boot.vfat", "boot"),
            ("sdcard.img", "sdcard"),
        ]);
        ArtifactPackager::default()
            .package(images.path(), "board_defconfig")
            .unwrap_err();

        let mut names: Vec<_> = std::fs::read_dir(images.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["boot.vfat", "sdcard.img", "u-boot-rockchip.bin"]);
    }

    #[test]
    fn test_digests_verify() {
        let images = full_images();
        let report = ArtifactPackager::default()
            .package(images.path(), "board_defconfig")
            .unwrap();
        for record in &report.digests {
            assert!(verify_digest_file(record).unwrap(), "{}", record.display());
        }
        let content =
            std::fs::read_to_string(images.path().join("u-boot.bin.md5sum")).unwrap();
        assert!(content.ends_with("  u-boot.bin\n"));
    }

    #[test]
    fn test_tampered_artifact_fails_verification() {
        let images = full_images();
        ArtifactPackager::default()
            .package(images.path(), "board_defconfig")
            .unwrap();
        std::fs::write(images.path().join("rootfs.squashfs"), b"changed").unwrap();
        assert!(!verify_digest_file(&images.path().join("rootfs.squashfs.md5sum")).unwrap());
    }

    #[test]
    fn test_malformed_digest_rejected() {
        let images = images_with(&[("x.md5sum", "nonsense\n")]);
        assert!(matches!(
            verify_digest_file(&images.path().join("x.md5sum")),
            Err(PackageError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_working_directory_unchanged() {
        let before = std::env::current_dir().unwrap();
        let images = full_images();
        let _ = ArtifactPackager::default().package(images.path(), "board_defconfig");
        let missing = images_with(&[]);
        let _ = ArtifactPackager::default().package(missing.path(), "board_defconfig");
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_custom_canonical_name_equal_to_source() {
        let images = images_with(&[("u-boot.bin", "uboot"), ("rootfs.squashfs", "r")]);
        let set = ArtifactSet {
            bootloader: "u-boot.bin".to_string(),
            ..ArtifactSet::default()
        };
        let report = ArtifactPackager::new(set)
            .package(images.path(), "board_defconfig")
            .unwrap();
        assert!(report.bundle.is_file());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn test_bundle_named_after_stripped_defconfig(defconfig in defconfig_name()) {
            let images = full_images();
            let report = ArtifactPackager::default()
                .package(images.path(), &defconfig)
                .unwrap();
            let expected = format!("{}.tar.gz", board_name(&defconfig));
            prop_assert_eq!(
                report.bundle.file_name().unwrap().to_string_lossy().into_owned(),
                expected
            );
        }
    }
}
