//! Drive-lettered path resolution and the tweak directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrefixError;

/// Tweak definition directories in priority order, highest first.
///
/// The user-writable layer (`~/.config/prefixer/tweaks`) shadows the
/// system-wide one (`/usr/share/prefixer/tweaks`).
#[must_use]
pub fn tweak_layers() -> Vec<PathBuf> {
    let mut layers = Vec::new();
    if let Some(config) = dirs::config_dir() {
        layers.push(config.join("prefixer").join("tweaks"));
    }
    layers.push(PathBuf::from("/usr/share/prefixer/tweaks"));
    layers
}

/// Map a drive-lettered Windows path to a real filesystem path using the
/// prefix's `dosdevices` drive-mapping symlinks.
///
/// The drive letter is case-normalized; backslashes in the tail are
/// normalized to forward slashes. The mapping symlink is checked without
/// following it — a dangling symlink still counts as a present mapping.
///
/// # Errors
///
/// Returns [`PrefixError::NotAbsolute`] when the path carries no drive
/// separator, [`PrefixError::DriveNotMapped`] when the `dosdevices` symlink
/// does not exist, and [`PrefixError::DriveUnresolvable`] when the symlink
/// target cannot be resolved.
pub fn resolve_path(prefix_root: &Path, windows_path: &str) -> Result<PathBuf, PrefixError> {
    let Some((drive, tail)) = windows_path.split_once(':') else {
        return Err(PrefixError::NotAbsolute(windows_path.to_string()));
    };

    let drive = drive.to_lowercase();
    let tail = tail.replace('\\', "/");
    let tail = tail.trim_start_matches('/');

    let link = prefix_root.join("dosdevices").join(format!("{drive}:"));
    if fs::symlink_metadata(&link).is_err() {
        return Err(PrefixError::DriveNotMapped(drive));
    }

    let root = fs::canonicalize(&link).map_err(|source| PrefixError::DriveUnresolvable {
        path: link,
        source,
    })?;

    Ok(root.join(tail))
}
