//! Common test utilities and helpers
//!
//! Integration tests run the real `fwforge` binary against a fake `make`
//! placed first on `PATH`. The fake records every invocation, creates the
//! files Buildroot would create, and can be told to fail or to report
//! targets as unknown.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Defconfig used by most tests
pub const DEFCONFIG: &str = "testboard_defconfig";

/// Board name derived from [`DEFCONFIG`]
pub const BOARD: &str = "testboard";

/// Directory name of the pinned Buildroot tree
pub const BUILDROOT_DIR: &str = "buildroot-2024.02.6";

/// Stand-in for Buildroot's make
///
/// Every build writes a `>>> make <target>` line to stdout.
/// `FAKE_MAKE_MISSING` lists targets a `make -n` lookup rejects, `FAKE_MAKE_FAIL`
/// lists targets that exit with status 3, `FAKE_CONFIG` is written to the
/// workspace `.config` when a defconfig is applied.
const FAKE_MAKE: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_MAKE_LOG"
lookup=0
out=""
target=""
for arg in "$@"; do
    case "$arg" in
        -n) lookup=1 ;;
        O=*) out="${arg#O=}" ;;
        BR2_EXTERNAL=*) ;;
        *) target="$arg" ;;
    esac
done
if [ "$lookup" = 1 ]; then
    for missing in $FAKE_MAKE_MISSING; do
        [ "$missing" = "$target" ] && exit 2
    done
    exit 0
fi
echo ">>> make $target"
for failing in $FAKE_MAKE_FAIL; do
    [ "$failing" = "$target" ] && exit 3
done
case "$target" in
    *_defconfig)
        mkdir -p "$out"
        printf '%s\n' "$FAKE_CONFIG" > "$out/.config"
        ;;
    all|sdcard-image)
        mkdir -p "$out/images"
        for f in boot.vfat u-boot-rockchip.bin sdcard.img rootfs.squashfs; do
            echo "$f contents" > "$out/images/$f"
        done
        ;;
esac
exit 0
"#;

/// Test project context
///
/// A temporary project directory with a pre-provisioned Buildroot tree and
/// the fake `make` in `bin/`.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    missing: Vec<String>,
    failing: Vec<String>,
    config: String,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            missing: Vec::new(),
            failing: Vec::new(),
            config: String::new(),
        };
        project.create_dir(BUILDROOT_DIR);
        project.create_file("bin/make", FAKE_MAKE);
        let make = project.path().join("bin/make");
        std::fs::set_permissions(&make, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake make executable");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Report `target` as unknown when looked up
    pub fn missing_target(mut self, target: &str) -> Self {
        self.missing.push(target.to_string());
        self
    }

    /// Make `target` exit with status 3
    pub fn failing_target(mut self, target: &str) -> Self {
        self.failing.push(target.to_string());
        self
    }

    /// Content written to `.config` when the defconfig is applied
    pub fn applied_config(mut self, content: &str) -> Self {
        self.config = content.to_string();
        self
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Images directory of the default workspace, relative to the project
    pub fn images(&self, name: &str) -> String {
        format!("output/{DEFCONFIG}/images/{name}")
    }

    /// Build targets passed to make, in order; lookups are prefixed with `?`
    pub fn make_calls(&self) -> Vec<String> {
        if !self.file_exists("make.log") {
            return Vec::new();
        }
        self.read_file("make.log")
            .lines()
            .map(|line| {
                let target = line.split_whitespace().last().unwrap_or_default();
                if line.starts_with("-n ") {
                    format!("?{target}")
                } else {
                    target.to_string()
                }
            })
            .collect()
    }

    /// Raw make command lines
    pub fn make_lines(&self) -> Vec<String> {
        if !self.file_exists("make.log") {
            return Vec::new();
        }
        self.read_file("make.log").lines().map(String::from).collect()
    }

    /// Command running fwforge in this project with the fake make on PATH
    pub fn command(&self) -> Command {
        let path = format!(
            "{}:{}",
            self.path().join("bin").display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fwforge"));
        cmd.current_dir(self.path())
            .env("PATH", path)
            .env("FAKE_MAKE_LOG", self.path().join("make.log"))
            .env("FAKE_MAKE_MISSING", self.missing.join(" "))
            .env("FAKE_MAKE_FAIL", self.failing.join(" "))
            .env("FAKE_CONFIG", &self.config)
            .env_remove("FWFORGE_ACTION")
            .env_remove("FWFORGE_OUTPUT")
            .env_remove("FWFORGE_DEFCONFIG")
            .env_remove("BR2_EXTERNAL")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run fwforge with the default defconfig and `args`
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(["-d", DEFCONFIG])
            .args(args)
            .output()
            .expect("Failed to execute fwforge")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout as a string
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as a string
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
