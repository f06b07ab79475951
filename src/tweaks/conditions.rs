//! Built-in condition handlers.
//!
//! Each handler receives a spec whose placeholders are already resolved and
//! whose field contract has been validated. Handlers answer the predicate
//! itself; inversion is applied by the engine.

use std::fs;
use std::path::Path;

use crate::error::{Result, TaskError};
use crate::regedit::{self, NONE_SENTINEL};

use super::context::RuntimeContext;
use super::model::ConditionSpec;

/// `file_exists`: the file or directory named by `filename` exists.
pub fn file_exists(spec: &ConditionSpec, _runtime: &RuntimeContext) -> Result<bool> {
    Ok(Path::new(spec.filename()?).exists())
}

/// `file_matches`: `filename` resolves to the same real file as `matches`.
///
/// Both sides are canonicalized, so symlinks and relative segments compare
/// equal to their targets. A missing file on either side makes the
/// condition false; other I/O failures propagate.
pub fn file_matches(spec: &ConditionSpec, _runtime: &RuntimeContext) -> Result<bool> {
    let Some(lhs) = canonical(spec.filename()?)? else {
        return Ok(false);
    };
    let Some(rhs) = canonical(spec.matches()?)? else {
        return Ok(false);
    };
    Ok(lhs == rhs)
}

fn canonical(path: &str) -> Result<Option<std::path::PathBuf>> {
    match fs::canonicalize(path) {
        Ok(p) => Ok(Some(p)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TaskError::io(path, e).into()),
    }
}

/// `env_matches`: the environment variable named by `value` equals
/// `matches`. An unset variable never matches.
pub fn env_matches(spec: &ConditionSpec, _runtime: &RuntimeContext) -> Result<bool> {
    let expected = spec.matches()?;
    Ok(std::env::var(spec.value()?).is_ok_and(|v| v == expected))
}

/// `reg_matches`: every entry of `values` holds in the hive named by
/// `filename` under the node at `path`.
///
/// Comparison is textual against the raw stored value (quoting and
/// `dword:` markers included). An expected value of the absence sentinel
/// instead requires the key to not exist. A hive file that cannot be read
/// propagates as an error rather than evaluating false.
pub fn reg_matches(spec: &ConditionSpec, runtime: &RuntimeContext) -> Result<bool> {
    let hive_path = runtime.prefix().pfx_path.join(spec.filename()?);
    let hive = regedit::load_hive(&hive_path)?;
    let node_path = spec.path()?.replace('\\', "\\\\");
    let node = hive.node(&node_path);

    for (name, expected) in spec.values()? {
        let actual = node.and_then(|n| n.get(name));
        let holds = if expected == NONE_SENTINEL {
            actual.is_none()
        } else {
            actual == Some(expected.as_str())
        };
        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::test_helpers::make_runtime;
    use super::*;

    fn cond(cond_type: &str) -> ConditionSpec {
        ConditionSpec {
            cond_type: cond_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn file_exists_reflects_the_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let file = tmp.path().join("marker");
        let mut spec = cond("file_exists");
        spec.filename = Some(file.display().to_string());
        assert!(!file_exists(&spec, &runtime).unwrap());

        fs::write(&file, "x").unwrap();
        assert!(file_exists(&spec, &runtime).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn file_matches_follows_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let target = tmp.path().join("real");
        fs::write(&target, "x").unwrap();
        let link = tmp.path().join("alias");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut spec = cond("file_matches");
        spec.filename = Some(link.display().to_string());
        spec.matches = Some(target.display().to_string());
        assert!(file_matches(&spec, &runtime).unwrap());

        let other = tmp.path().join("other");
        fs::write(&other, "y").unwrap();
        spec.matches = Some(other.display().to_string());
        assert!(!file_matches(&spec, &runtime).unwrap());
    }

    #[test]
    fn file_matches_is_false_when_either_side_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let present = tmp.path().join("present");
        fs::write(&present, "x").unwrap();

        let mut spec = cond("file_matches");
        spec.filename = Some(tmp.path().join("gone").display().to_string());
        spec.matches = Some(present.display().to_string());
        assert!(!file_matches(&spec, &runtime).unwrap());
    }

    #[test]
    fn env_matches_handles_set_and_unset() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let mut spec = cond("env_matches");
        spec.value = Some("PREFIXER_COND_TEST_UNSET".to_string());
        spec.matches = Some("anything".to_string());
        assert!(!env_matches(&spec, &runtime).unwrap());

        // PATH is always set but will not equal this marker.
        spec.value = Some("PATH".to_string());
        spec.matches = Some("definitely-not-the-path".to_string());
        assert!(!env_matches(&spec, &runtime).unwrap());
    }

    #[test]
    fn reg_matches_compares_raw_values_and_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let hive = "WINE REGISTRY Version 2\n\
                    ;; All keys relative to \\\\User\\\\S-1-5-21\n\n\
                    [Software\\\\Wine\\\\DllOverrides] 1600000000\n\
                    \"winhttp\"=\"native,builtin\"\n";
        fs::write(tmp.path().join("user.reg"), hive).unwrap();

        let mut spec = cond("reg_matches");
        spec.filename = Some("user.reg".to_string());
        spec.path = Some("Software\\Wine\\DllOverrides".to_string());

        let mut values = BTreeMap::new();
        values.insert("winhttp".to_string(), "\"native,builtin\"".to_string());
        spec.values = Some(values.clone());
        assert!(reg_matches(&spec, &runtime).unwrap());

        values.insert("winhttp".to_string(), "\"builtin\"".to_string());
        spec.values = Some(values.clone());
        assert!(!reg_matches(&spec, &runtime).unwrap());

        values.clear();
        values.insert("absent".to_string(), NONE_SENTINEL.to_string());
        spec.values = Some(values.clone());
        assert!(reg_matches(&spec, &runtime).unwrap());

        values.insert("winhttp".to_string(), NONE_SENTINEL.to_string());
        spec.values = Some(values);
        assert!(!reg_matches(&spec, &runtime).unwrap());
    }

    #[test]
    fn reg_matches_on_a_missing_node_only_passes_for_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let hive = "WINE REGISTRY Version 2\n;; relative\n";
        fs::write(tmp.path().join("user.reg"), hive).unwrap();

        let mut spec = cond("reg_matches");
        spec.filename = Some("user.reg".to_string());
        spec.path = Some("Software\\Missing".to_string());

        let mut values = BTreeMap::new();
        values.insert("x".to_string(), NONE_SENTINEL.to_string());
        spec.values = Some(values.clone());
        assert!(reg_matches(&spec, &runtime).unwrap());

        values.insert("x".to_string(), "\"1\"".to_string());
        spec.values = Some(values);
        assert!(!reg_matches(&spec, &runtime).unwrap());
    }

    #[test]
    fn reg_matches_propagates_a_missing_hive() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let mut spec = cond("reg_matches");
        spec.filename = Some("no-such.reg".to_string());
        spec.path = Some("Software".to_string());
        let mut values = BTreeMap::new();
        values.insert("x".to_string(), "\"1\"".to_string());
        spec.values = Some(values);
        assert!(reg_matches(&spec, &runtime).is_err());
    }
}
