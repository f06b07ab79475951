//! Deterministic serializer for registry hive text.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::HiveError;

use super::model::RegistryHive;

/// Serialize a hive to its line representation.
///
/// Emits the header, the relative-comment line, the `#arch=` directive, and
/// then every node in sorted path order with its values in sorted name
/// order. Nodes holding no values are not written back. Nodes marked
/// `changed` are stamped with the current time; unchanged nodes keep their
/// parsed timestamp, so re-serializing an untouched hive is
/// byte-reproducible.
#[must_use]
pub fn serialize_hive(hive: &RegistryHive) -> Vec<String> {
    let now = unix_now();
    let mut lines = vec![
        hive.header.clone(),
        hive.relative.clone(),
        String::new(),
        format!("#arch={}", hive.arch),
        String::new(),
    ];

    for node in hive.nodes() {
        if node.is_empty() {
            continue;
        }

        let stamp = if node.changed { now } else { node.timestamp };
        lines.push(format!("[{}] {stamp}", node.path));

        for (name, raw) in node.values() {
            if name == "@" {
                lines.push(format!("@={raw}"));
            } else {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                lines.push(format!("\"{escaped}\"={raw}"));
            }
        }

        lines.push(String::new());
    }

    lines
}

/// Serialize a hive and write it to `path`.
///
/// # Errors
///
/// Returns [`HiveError::Io`] when the file cannot be written.
pub fn save_hive(hive: &RegistryHive, path: &Path) -> Result<(), HiveError> {
    let mut content = serialize_hive(hive).join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|source| HiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Current time in Unix seconds.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
