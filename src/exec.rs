//! External process execution for the wrapped Wine/Proton runtime.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::TaskError;

/// Result of a wrapped-runtime invocation.
///
/// Child processes inherit the console (installers may be interactive), so
/// only the exit status is captured.
#[derive(Debug, Clone, Copy)]
pub struct ExecResult {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, when one was reported.
    pub code: Option<i32>,
}

/// Capability to run an executable inside a prefix.
///
/// Implemented by [`WineRunner`] for real prefixes and by recording stubs in
/// tests, so task handlers never spawn processes directly.
pub trait Runner: Send + Sync {
    /// Run `exe` with `args` inside the prefix, blocking until it exits.
    ///
    /// With `quiet` set, the child's stdout and stderr are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Io`] when the runtime binary cannot be spawned.
    fn run(&self, exe: &Path, args: &[String], quiet: bool) -> Result<ExecResult, TaskError>;
}

/// Runs executables through a Wine binary or a Proton wrapper script.
///
/// Sets the `WINEPREFIX`, `STEAM_COMPAT_DATA_PATH`, and
/// `STEAM_COMPAT_CLIENT_INSTALL_PATH` environment expected by both runtimes.
/// Proton scripts take a `run` verb before the target executable; plain Wine
/// does not.
#[derive(Debug, Clone)]
pub struct WineRunner {
    binary: PathBuf,
    pfx_path: PathBuf,
    use_run_verb: bool,
}

impl WineRunner {
    /// Create a runner for the given runtime binary and prefix root.
    #[must_use]
    pub fn new(binary: PathBuf, pfx_path: PathBuf) -> Self {
        let use_run_verb = binary
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains("proton"));
        Self {
            binary,
            pfx_path,
            use_run_verb,
        }
    }
}

impl Runner for WineRunner {
    fn run(&self, exe: &Path, args: &[String], quiet: bool) -> Result<ExecResult, TaskError> {
        let mut cmd = Command::new(&self.binary);
        if self.use_run_verb {
            cmd.arg("run");
        }
        cmd.arg(exe).args(args);

        cmd.env("WINEPREFIX", &self.pfx_path);
        if let Some(parent) = self.pfx_path.parent() {
            cmd.env("STEAM_COMPAT_DATA_PATH", parent);
        }
        if let Some(home) = dirs::home_dir() {
            cmd.env("STEAM_COMPAT_CLIENT_INSTALL_PATH", home.join(".steam/steam"));
        }

        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd
            .status()
            .map_err(|source| TaskError::io(self.binary.clone(), source))?;

        Ok(ExecResult {
            success: status.success(),
            code: status.code(),
        })
    }
}
