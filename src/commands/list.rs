//! Command: list available tweaks across all layers.

use anyhow::Result;

use crate::paths;
use crate::tweaks::load_tweaks;

/// Run the list command.
///
/// Shows every visible tweak with its description and the layer it loads
/// from. Definitions that fail to parse are listed with the failure
/// instead of aborting the listing.
///
/// # Errors
///
/// Returns an error when a layer directory cannot be scanned.
pub fn run() -> Result<()> {
    let set = load_tweaks(&paths::tweak_layers())?;
    let definitions = set.definitions();
    if definitions.is_empty() {
        println!("no tweaks installed");
        return Ok(());
    }

    let width = definitions
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    for (name, layer) in definitions {
        match set.build(&name) {
            Ok(tweak) => {
                println!("{name:<width$}  {}  [{}]", tweak.description, layer.display());
            }
            Err(e) => println!("{name:<width$}  (unloadable: {e})"),
        }
    }
    Ok(())
}
