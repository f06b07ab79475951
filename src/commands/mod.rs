pub mod apply;
pub mod info;
pub mod list;
pub mod run;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::prefix::{self, DiscoveryOpts, Prefix};

/// Resolve the target prefix from the global CLI options.
///
/// # Errors
///
/// Returns an error when no provider can supply a usable prefix.
pub(crate) fn discover_prefix(global: &GlobalOpts) -> Result<Prefix> {
    let opts = DiscoveryOpts {
        prefix_path: global.prefix.clone(),
        program_dir: global.program_dir.clone(),
        runner_binary: global.runner_binary.clone(),
    };
    let prefix = prefix::discover(&opts)?;
    tracing::debug!("target prefix: {}", prefix.pfx_path.display());
    Ok(prefix)
}
