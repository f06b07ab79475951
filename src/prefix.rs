//! The target environment abstraction and its discovery providers.
//!
//! A [`Prefix`] bundles the paths the engine needs (the prefix root holding
//! the registry hives, and the working-files directory of the wrapped
//! program) with a [`Runner`] for executing binaries inside it. Providers
//! translate provider-specific discovery logic into that uniform concept;
//! the engine itself never knows where a prefix came from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PrefixError, TaskError};
use crate::exec::{ExecResult, Runner, WineRunner};

/// A compatibility prefix: the target environment of a tweak run.
pub struct Prefix {
    /// Display name (usually the prefix directory name).
    pub name: String,
    /// Prefix root: holds `dosdevices/`, `drive_c/`, and the registry hives.
    pub pfx_path: PathBuf,
    /// Working-files directory of the wrapped program.
    pub files_path: PathBuf,
    runner: Arc<dyn Runner>,
}

impl Prefix {
    /// Assemble a prefix from its paths and a runner.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        pfx_path: PathBuf,
        files_path: PathBuf,
        runner: Arc<dyn Runner>,
    ) -> Self {
        Self {
            name: name.into(),
            pfx_path,
            files_path,
            runner,
        }
    }

    /// Run an executable inside this prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Io`] when the runtime binary cannot be spawned.
    pub fn run(&self, exe: &Path, args: &[String], quiet: bool) -> Result<ExecResult, TaskError> {
        self.runner.run(exe, args, quiet)
    }
}

impl std::fmt::Debug for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefix")
            .field("name", &self.name)
            .field("pfx_path", &self.pfx_path)
            .field("files_path", &self.files_path)
            .field("runner", &"<dyn Runner>")
            .finish()
    }
}

/// Caller-supplied overrides for prefix discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOpts {
    /// Explicit prefix root, bypassing provider defaults.
    pub prefix_path: Option<PathBuf>,
    /// Explicit working-files directory.
    pub program_dir: Option<PathBuf>,
    /// Explicit runtime binary (Wine or a Proton script).
    pub runner_binary: Option<PathBuf>,
}

/// A discovery backend producing the uniform [`Prefix`] concept.
pub trait PrefixProvider: Send + Sync {
    /// Short identifier for log messages.
    fn name(&self) -> &'static str;

    /// Attempt discovery; `Ok(None)` means this provider does not apply.
    ///
    /// # Errors
    ///
    /// Returns [`PrefixError`] when the provider applies but its environment
    /// is unusable (e.g. an explicitly named prefix that does not exist).
    fn discover(&self, opts: &DiscoveryOpts) -> Result<Option<Prefix>, PrefixError>;
}

/// Builds a prefix from explicit paths and environment overrides.
///
/// Resolution order per component: CLI option, then the `PREFIX_PATH` /
/// `PROGRAM_PATH` / `WINE_BINARY` environment variables, then a default
/// (`~/.wine`, the current directory, and `wine` on `PATH` respectively).
#[derive(Debug, Clone, Copy)]
pub struct DirectProvider;

impl PrefixProvider for DirectProvider {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn discover(&self, opts: &DiscoveryOpts) -> Result<Option<Prefix>, PrefixError> {
        let Some(pfx_path) = opts
            .prefix_path
            .clone()
            .or_else(|| std::env::var_os("PREFIX_PATH").map(PathBuf::from))
            .or_else(|| dirs::home_dir().map(|h| h.join(".wine")))
        else {
            return Ok(None);
        };

        if !pfx_path.is_dir() {
            return Err(PrefixError::Discovery(format!(
                "prefix directory {} does not exist",
                pfx_path.display()
            )));
        }

        let files_path = opts
            .program_dir
            .clone()
            .or_else(|| std::env::var_os("PROGRAM_PATH").map(PathBuf::from))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let binary = match opts
            .runner_binary
            .clone()
            .or_else(|| std::env::var_os("WINE_BINARY").map(PathBuf::from))
        {
            Some(b) => b,
            None => which::which("wine").map_err(|_| {
                PrefixError::Discovery(
                    "no wine binary found on PATH; set WINE_BINARY or pass --runner-binary"
                        .to_string(),
                )
            })?,
        };

        let name = pfx_path
            .file_name()
            .map_or_else(|| "prefix".to_string(), |n| n.to_string_lossy().to_string());
        let runner = Arc::new(WineRunner::new(binary, pfx_path.clone()));

        Ok(Some(Prefix::new(name, pfx_path, files_path, runner)))
    }
}

/// The capability registry of discovery backends, in trial order.
#[must_use]
pub fn providers() -> Vec<Box<dyn PrefixProvider>> {
    vec![Box::new(DirectProvider)]
}

/// Run the provider registry and return the first prefix produced.
///
/// # Errors
///
/// Returns the first provider error, or [`PrefixError::Discovery`] when no
/// provider applies.
pub fn discover(opts: &DiscoveryOpts) -> Result<Prefix, PrefixError> {
    for provider in providers() {
        if let Some(prefix) = provider.discover(opts)? {
            tracing::debug!(
                "provider '{}' supplied prefix {}",
                provider.name(),
                prefix.pfx_path.display()
            );
            return Ok(prefix);
        }
    }
    Err(PrefixError::Discovery(
        "no provider could locate a target prefix".to_string(),
    ))
}
