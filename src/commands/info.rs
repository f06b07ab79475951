//! Command: show prefix details, applied tweaks, and DLL overrides.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::regedit;
use crate::tweaks::read_history;

/// Node path of Wine's DLL override table in `user.reg`.
const DLL_OVERRIDES: &str = "Software\\\\Wine\\\\DllOverrides";

/// Run the info command.
///
/// # Errors
///
/// Returns an error if prefix discovery fails or `user.reg` exists but
/// cannot be parsed.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let prefix = super::discover_prefix(global)?;

    let is_win64 = prefix
        .pfx_path
        .join("drive_c")
        .join("windows")
        .join("syswow64")
        .is_dir();

    println!("prefix : {}", prefix.name);
    println!("path   : {}", prefix.pfx_path.display());
    println!("64-bit : {is_win64}");
    println!();

    println!("applied tweaks");
    println!("==============");
    let history = read_history(&prefix.pfx_path)?;
    if history.is_empty() {
        println!("(none)");
    } else {
        for name in history {
            println!("{name}");
        }
    }
    println!();

    println!("DLL overrides");
    println!("=============");
    let overrides = dll_overrides(&prefix.pfx_path)?;
    if overrides.is_empty() {
        println!("(none)");
    } else {
        let width = overrides.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (dll, mode) in overrides {
            println!("{dll:<width$} : {mode}");
        }
    }
    Ok(())
}

/// Read the DLL override table from the prefix's `user.reg`, with display
/// formatting stripped. A missing hive reads as empty.
fn dll_overrides(pfx_path: &std::path::Path) -> Result<Vec<(String, String)>> {
    let hive_path = pfx_path.join("user.reg");
    if !hive_path.is_file() {
        return Ok(Vec::new());
    }

    let hive = regedit::load_hive(&hive_path)?;
    let Some(node) = hive.node(DLL_OVERRIDES) else {
        return Ok(Vec::new());
    };

    Ok(node
        .values()
        .map(|(name, raw)| (name.to_string(), display_value(raw)))
        .collect())
}

/// Strip quoting or the `dword:` marker for human-readable output.
fn display_value(raw: &str) -> String {
    if let Some(stripped) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        stripped.to_string()
    } else if let Some(stripped) = raw.strip_prefix("dword:") {
        stripped.to_string()
    } else {
        raw.to_string()
    }
}
