//! Buildroot invocation
//!
//! [`Toolchain`] turns a target name into the `make` command line used for
//! every delegated call. [`DryRun`] prints those command lines instead of
//! running them. Both write to the configured [`OutputStream`].

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::core::build_system::BuildSystem;
use crate::core::request::BuildRequest;
use crate::error::BuildError;

/// Destination for make's stdout and for dry-run command lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStream {
    /// Inherit stdout
    #[default]
    Stdout,
    /// Redirect to stderr
    Stderr,
    /// Discard
    Null,
}

impl OutputStream {
    fn stdio(self) -> Stdio {
        match self {
            Self::Stdout => Stdio::inherit(),
            Self::Stderr => Stdio::from(std::io::stderr()),
            Self::Null => Stdio::null(),
        }
    }

    fn print(self, line: &str) {
        match self {
            Self::Stdout => println!("{line}"),
            Self::Stderr => eprintln!("{line}"),
            Self::Null => {}
        }
    }
}

/// Handle on an unpacked Buildroot tree bound to one workspace
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Buildroot source tree
    source_dir: PathBuf,
    /// External project tree (`BR2_EXTERNAL`)
    external_root: PathBuf,
    /// Per-configuration output workspace (`O=`)
    workspace: PathBuf,
    /// make executable
    make: PathBuf,
    /// Where make's stdout goes
    output: OutputStream,
}

impl Toolchain {
    /// Create a handle for the request's workspace
    pub fn new(source_dir: &Path, external_root: &Path, request: &BuildRequest) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            external_root: external_root.to_path_buf(),
            workspace: request.workspace(),
            make: PathBuf::from("make"),
            output: OutputStream::default(),
        }
    }

    /// Send make's stdout to `output`
    #[must_use]
    pub fn with_output(mut self, output: OutputStream) -> Self {
        self.output = output;
        self
    }

    /// Where make's stdout goes
    pub fn output(&self) -> OutputStream {
        self.output
    }

    /// Buildroot source tree
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// External project tree
    pub fn external_root(&self) -> &Path {
        &self.external_root
    }

    /// Output workspace
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Arguments passed to make for `target`
    pub fn args(&self, target: &str) -> Vec<OsString> {
        let mut out_arg = OsString::from("O=");
        out_arg.push(&self.workspace);
        let mut external_arg = OsString::from("BR2_EXTERNAL=");
        external_arg.push(&self.external_root);

        vec![
            OsString::from("-C"),
            self.source_dir.clone().into_os_string(),
            out_arg,
            external_arg,
            OsString::from(target),
        ]
    }

    /// Command that builds `target`; nothing is spawned
    pub fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.make);
        cmd.args(self.args(target));
        cmd
    }

    /// Command that checks `target` without executing recipes
    pub fn lookup_command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.make);
        cmd.arg("-n").args(self.args(target));
        cmd
    }

    /// Printable form of the command for `target`
    pub fn display_command(&self, target: &str) -> String {
        let mut line = self.make.display().to_string();
        for arg in self.args(target) {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl BuildSystem for Toolchain {
    fn invoke(&self, step: &str, target: &str) -> Result<(), BuildError> {
        tracing::info!("[{step}] make {target}");
        tracing::debug!("Running: {}", self.display_command(target));

        let status = self
            .command(target)
            .stdout(self.output.stdio())
            .status()
            .map_err(|e| BuildError::Spawn {
                step: step.to_string(),
                target: target.to_string(),
                error: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::CommandFailed {
                step: step.to_string(),
                target: target.to_string(),
                status: status.code(),
            })
        }
    }

    fn try_resolve_target(&self, target: &str) -> bool {
        let resolvable = self
            .lookup_command(target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        tracing::debug!("Lookup of target '{target}': resolvable={resolvable}");
        resolvable
    }
}

/// Build system that prints commands instead of running them
///
/// Every lookup reports the target as resolvable.
#[derive(Debug)]
pub struct DryRun {
    toolchain: Toolchain,
    commands: RefCell<Vec<String>>,
}

impl DryRun {
    /// Wrap a toolchain
    pub fn new(toolchain: Toolchain) -> Self {
        Self {
            toolchain,
            commands: RefCell::new(Vec::new()),
        }
    }

    /// Command lines that would have run, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl BuildSystem for DryRun {
    fn invoke(&self, step: &str, target: &str) -> Result<(), BuildError> {
        let line = self.toolchain.display_command(target);
        self.toolchain.output.print(&format!("[{step}] {line}"));
        self.commands.borrow_mut().push(line);
        Ok(())
    }

    fn try_resolve_target(&self, target: &str) -> bool {
        tracing::debug!("Dry run: assuming target '{target}' is resolvable");
        true
    }
}
