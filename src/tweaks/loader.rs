//! Layered tweak definition loading.
//!
//! Definitions live as relaxed-JSON files under one or more layer
//! directories, highest priority first. A [`TweakSet`] indexes names to
//! file paths; documents are parsed fresh on every build so an edited
//! definition takes effect without restarting anything that embeds the
//! engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DefinitionError;

use super::model::{ConditionSpec, TaskSpec, TweakDefinition};

/// On-disk shape of a tweak definition document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    description: String,
    tasks: Vec<TaskSpec>,
    #[serde(default)]
    conditions: Vec<ConditionSpec>,
}

/// One definition directory and its name index.
#[derive(Debug)]
struct Layer {
    root: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

/// The definition layers in priority order.
#[derive(Debug)]
pub struct TweakSet {
    layers: Vec<Layer>,
}

/// Scan the given layer directories, creating any that are missing.
///
/// # Errors
///
/// Returns [`DefinitionError::Io`] when a layer directory cannot be
/// created or read. A layer that cannot be created (e.g. the system-wide
/// path on a read-only filesystem) is skipped silently instead.
pub fn load_tweaks(layer_dirs: &[PathBuf]) -> Result<TweakSet, DefinitionError> {
    let mut layers = Vec::new();
    for root in layer_dirs {
        if !root.is_dir() && fs::create_dir_all(root).is_err() {
            tracing::debug!("skipping unavailable tweak layer {}", root.display());
            continue;
        }
        let mut entries = BTreeMap::new();
        scan_dir(root, "", &mut entries)?;
        layers.push(Layer {
            root: root.clone(),
            entries,
        });
    }
    Ok(TweakSet { layers })
}

/// Recursively index a layer directory.
///
/// Subdirectory names become dotted namespace segments: `dxvk/async.json`
/// loads as `dxvk.async`.
fn scan_dir(
    dir: &Path,
    namespace: &str,
    entries: &mut BTreeMap<String, PathBuf>,
) -> Result<(), DefinitionError> {
    let listing = fs::read_dir(dir).map_err(|source| DefinitionError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in listing {
        let entry = entry.map_err(|source| DefinitionError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        if path.is_dir() {
            let nested = if namespace.is_empty() {
                stem
            } else {
                format!("{namespace}.{stem}")
            };
            scan_dir(&path, &nested, entries)?;
        } else {
            let name = if namespace.is_empty() {
                stem
            } else {
                format!("{namespace}.{stem}")
            };
            entries.entry(name).or_insert(path);
        }
    }
    Ok(())
}

impl TweakSet {
    /// Locate the definition file for `name`, first matching layer wins.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Path> {
        self.layers
            .iter()
            .find_map(|layer| layer.entries.get(name))
            .map(PathBuf::as_path)
    }

    /// Parse the definition for `name` from its file.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::UnknownTweak`] when no layer carries the
    /// name, [`DefinitionError::Io`] when the file cannot be read, and
    /// [`DefinitionError::Invalid`] for an unparsable document or an empty
    /// task list.
    pub fn build(&self, name: &str) -> Result<TweakDefinition, DefinitionError> {
        let path = self
            .find(name)
            .ok_or_else(|| DefinitionError::UnknownTweak(name.to_string()))?;

        let content = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let doc: Document =
            json5::from_str(&content).map_err(|e| DefinitionError::Invalid {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        if doc.tasks.is_empty() {
            return Err(DefinitionError::Invalid {
                name: name.to_string(),
                message: "definition has no tasks".to_string(),
            });
        }

        Ok(TweakDefinition {
            name: name.to_string(),
            description: doc.description,
            tasks: doc.tasks,
            conditions: doc.conditions,
        })
    }

    /// All known tweak names across layers, sorted and deduplicated.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .layers
            .iter()
            .flat_map(|layer| layer.entries.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// `(name, defining layer root)` pairs for every visible definition.
    #[must_use]
    pub fn definitions(&self) -> Vec<(String, &Path)> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                let layer = self
                    .layers
                    .iter()
                    .find(|layer| layer.entries.contains_key(&name))?;
                Some((name, layer.root.as_path()))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        description: "a test tweak",
        tasks: [
            { description: "say hi", type: "message", content: "hi" },
        ],
    }"#;

    #[test]
    fn loads_and_builds_a_definition() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("hello.json"), MINIMAL).unwrap();

        let set = load_tweaks(&[tmp.path().to_path_buf()]).unwrap();
        let tweak = set.build("hello").unwrap();
        assert_eq!(tweak.name, "hello");
        assert_eq!(tweak.description, "a test tweak");
        assert_eq!(tweak.tasks.len(), 1);
        assert!(tweak.conditions.is_empty());
    }

    #[test]
    fn subdirectories_become_dotted_namespaces() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("dxvk")).unwrap();
        fs::write(tmp.path().join("dxvk/async.json"), MINIMAL).unwrap();

        let set = load_tweaks(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(set.names(), ["dxvk.async"]);
        assert!(set.build("dxvk.async").is_ok());
    }

    #[test]
    fn earlier_layers_shadow_later_ones() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();

        let shadowed = r#"{
            description: "system copy",
            tasks: [{ description: "x", type: "message", content: "system" }],
        }"#;
        fs::write(user.path().join("shared.json"), MINIMAL).unwrap();
        fs::write(system.path().join("shared.json"), shadowed).unwrap();
        fs::write(system.path().join("only-system.json"), MINIMAL).unwrap();

        let set = load_tweaks(&[user.path().to_path_buf(), system.path().to_path_buf()]).unwrap();
        assert_eq!(set.build("shared").unwrap().description, "a test tweak");
        assert!(set.build("only-system").is_ok());
        assert_eq!(set.names(), ["only-system", "shared"]);
    }

    #[test]
    fn missing_layers_are_created() {
        let tmp = tempfile::tempdir().unwrap();
        let layer = tmp.path().join("not-yet-there");
        let set = load_tweaks(&[layer.clone()]).unwrap();
        assert!(layer.is_dir());
        assert!(set.names().is_empty());
    }

    #[test]
    fn unknown_name_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let set = load_tweaks(&[tmp.path().to_path_buf()]).unwrap();
        assert!(matches!(
            set.build("nope"),
            Err(DefinitionError::UnknownTweak(n)) if n == "nope"
        ));
    }

    #[test]
    fn empty_task_list_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("empty.json"),
            r#"{ description: "nothing", tasks: [] }"#,
        )
        .unwrap();
        let set = load_tweaks(&[tmp.path().to_path_buf()]).unwrap();
        assert!(matches!(
            set.build("empty"),
            Err(DefinitionError::Invalid { .. })
        ));
    }

    #[test]
    fn unparsable_document_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("broken.json"), "{ not json5").unwrap();
        let set = load_tweaks(&[tmp.path().to_path_buf()]).unwrap();
        assert!(matches!(
            set.build("broken"),
            Err(DefinitionError::Invalid { .. })
        ));
    }

    #[test]
    fn definitions_report_the_winning_layer() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();
        fs::write(user.path().join("a.json"), MINIMAL).unwrap();
        fs::write(system.path().join("a.json"), MINIMAL).unwrap();
        fs::write(system.path().join("b.json"), MINIMAL).unwrap();

        let set = load_tweaks(&[user.path().to_path_buf(), system.path().to_path_buf()]).unwrap();
        let defs = set.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].0, "a");
        assert_eq!(defs[0].1, user.path());
        assert_eq!(defs[1].0, "b");
        assert_eq!(defs[1].1, system.path());
    }
}
