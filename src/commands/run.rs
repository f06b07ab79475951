//! Command: run an executable inside the target prefix.

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{GlobalOpts, RunOpts};
use crate::error::TaskError;
use crate::paths;

/// Run the run command.
///
/// A drive-lettered path is resolved through the prefix's drive mappings;
/// anything else passes through to the runtime as-is.
///
/// # Errors
///
/// Returns an error if prefix discovery or path resolution fails, or if
/// the executable exits with a failure status.
pub fn run(global: &GlobalOpts, opts: &RunOpts) -> Result<()> {
    let prefix = super::discover_prefix(global)?;

    let exe = if opts.exe.contains(':') {
        paths::resolve_path(&prefix.pfx_path, &opts.exe)?
    } else {
        PathBuf::from(&opts.exe)
    };

    tracing::info!("running {} in {}", exe.display(), prefix.name);
    let result = prefix.run(&exe, &opts.args, false)?;
    if !result.success {
        return Err(TaskError::Process {
            program: opts.exe.clone(),
            code: result.code,
        }
        .into());
    }
    Ok(())
}
