//! Default configuration values

/// Pinned Buildroot release
pub const BUILDROOT_VERSION: &str = "2024.02.6";

/// Directory the Buildroot tree is unpacked to, relative to the project
pub const BUILDROOT_SOURCE_DIR: &str = "buildroot-{version}";

/// Default board configuration
pub const DEFCONFIG: &str = "pixelpilot_defconfig";

/// Default output directory, relative to the project
pub const OUTPUT_DIR: &str = "output";

/// Default action when none is given
pub const ACTION: &str = "all";

/// Project configuration file name
pub const CONFIG_FILE: &str = "fwforge.toml";

/// Package names the fast rebuild may target, in priority order
pub const FAST_REBUILD_CANDIDATES: &[&str] = &["pixelpilot", "pixelpilot-rk"];

/// Directory depth searched for `<name>.mk` files under the external root
pub const PACKAGE_SEARCH_DEPTH: usize = 4;

/// Target regenerating the compressed root filesystem image
pub const ROOTFS_TARGET: &str = "rootfs-squashfs";

/// Most specific image target, checked before use
pub const IMAGE_TARGET: &str = "sdcard-image";

/// Target used when the image target cannot be resolved
pub const FALLBACK_TARGET: &str = "all";

/// Boot partition image
pub const BOOT_IMAGE: &str = "boot.vfat";

/// Bootloader binary as produced by the build
pub const BOOTLOADER: &str = "u-boot-rockchip.bin";

/// Canonical bootloader name shipped in the bundle
pub const BOOTLOADER_NAME: &str = "u-boot.bin";

/// Full flash image
pub const FLASH_IMAGE: &str = "sdcard.img";

/// Root filesystem image
pub const ROOTFS_IMAGE: &str = "rootfs.squashfs";

/// Attempts made by the native download transport
pub const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;
