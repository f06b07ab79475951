//! Command: apply a tweak to the target prefix.

use anyhow::Result;

use crate::cli::{ApplyOpts, GlobalOpts};
use crate::paths;
use crate::tweaks::{Engine, RuntimeContext, TweakOutcome, load_tweaks};

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if prefix discovery, definition loading, or any task
/// fails.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts) -> Result<()> {
    let prefix = super::discover_prefix(global)?;
    let set = load_tweaks(&paths::tweak_layers())?;

    let runtime = RuntimeContext::new(prefix, global.keep_temp, global.offline)?;
    let engine = Engine::new(&set);

    match engine.run_tweak(&opts.name, &runtime)? {
        TweakOutcome::Applied => tracing::info!("all tasks completed successfully"),
        TweakOutcome::Skipped => {
            tracing::info!("tweak '{}' was skipped: conditions not met", opts.name);
        }
    }
    Ok(())
}
