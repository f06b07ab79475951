//! The tweak execution engine.
//!
//! Takes a built definition and walks its tasks in order: resolve
//! placeholders, evaluate gating conditions, validate the field contract,
//! dispatch to the handler. A failed tweak-level condition skips the whole
//! tweak silently; a failed task-level condition skips just that task; a
//! handler error aborts the run.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{DefinitionError, Result, TaskError};

use super::context::RuntimeContext;
use super::loader::TweakSet;
use super::model::ConditionSpec;
use super::registry::{ConditionRegistry, TaskRegistry};
use super::schema::{validate_condition, validate_task};

/// Reserved task type for invoking one tweak from another. Dispatched by
/// the engine itself, never through the task registry.
pub const NESTED_TWEAK_TYPE: &str = "tweak";

/// Name of the applied-tweak history log inside the prefix root.
pub const HISTORY_FILE: &str = "tweaks.prefixer.txt";

/// What the engine did with a tweak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweakOutcome {
    /// All runnable tasks completed.
    Applied,
    /// A tweak-level condition did not hold; nothing ran.
    Skipped,
}

/// Executes tweaks from a [`TweakSet`] using explicit dispatch registries.
pub struct Engine<'a> {
    tweaks: &'a TweakSet,
    tasks: TaskRegistry,
    conditions: ConditionRegistry,
}

impl<'a> Engine<'a> {
    /// An engine with the built-in task and condition handlers.
    #[must_use]
    pub fn new(tweaks: &'a TweakSet) -> Self {
        Self::with_registries(tweaks, TaskRegistry::builtin(), ConditionRegistry::builtin())
    }

    /// An engine with caller-supplied registries.
    #[must_use]
    pub const fn with_registries(
        tweaks: &'a TweakSet,
        tasks: TaskRegistry,
        conditions: ConditionRegistry,
    ) -> Self {
        Self {
            tweaks,
            tasks,
            conditions,
        }
    }

    /// Run the named tweak against `runtime`.
    ///
    /// On success the tweak is recorded in the prefix's history log
    /// (skipped tweaks are not).
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] for lookup, parse, or contract
    /// failures and whatever error the first failing handler produced.
    pub fn run_tweak(&self, name: &str, runtime: &RuntimeContext) -> Result<TweakOutcome> {
        let mut chain = Vec::new();
        let outcome = self.run_inner(name, runtime, &mut chain)?;
        if outcome == TweakOutcome::Applied {
            record_history(&runtime.prefix().pfx_path, name)?;
        }
        Ok(outcome)
    }

    fn run_inner(
        &self,
        name: &str,
        runtime: &RuntimeContext,
        chain: &mut Vec<String>,
    ) -> Result<TweakOutcome> {
        if chain.iter().any(|n| n == name) {
            let mut names = chain.clone();
            names.push(name.to_string());
            return Err(DefinitionError::RecursionLoop {
                chain: names.join(" -> "),
            }
            .into());
        }
        chain.push(name.to_string());
        let outcome = self.run_tasks(name, runtime, chain);
        chain.pop();
        outcome
    }

    fn run_tasks(
        &self,
        name: &str,
        runtime: &RuntimeContext,
        chain: &mut Vec<String>,
    ) -> Result<TweakOutcome> {
        let tweak = self.tweaks.build(name)?;
        tracing::info!("tweak: {} ({})", tweak.name, tweak.description);

        for condition in &tweak.conditions {
            if !self.eval_condition(condition, runtime)? {
                tracing::info!("conditions not met, skipping {}", tweak.name);
                return Ok(TweakOutcome::Skipped);
            }
        }

        'tasks: for spec in &tweak.tasks {
            let mut spec = spec.clone();
            spec.resolve_placeholders(runtime);

            for condition in &spec.conditions {
                if !self.eval_condition(condition, runtime)? {
                    tracing::info!("skipping task '{}'", spec.description);
                    continue 'tasks;
                }
            }

            validate_task(&spec)?;
            tracing::info!("task: {}", spec.description);

            if spec.task_type == NESTED_TWEAK_TYPE {
                self.run_inner(spec.name()?, runtime, chain)?;
            } else {
                let handler = self
                    .tasks
                    .get(&spec.task_type)
                    .ok_or_else(|| DefinitionError::UnknownTaskType(spec.task_type.clone()))?;
                handler(&spec, runtime)?;
            }
        }

        Ok(TweakOutcome::Applied)
    }

    /// Evaluate one condition spec, applying inversion.
    fn eval_condition(&self, spec: &ConditionSpec, runtime: &RuntimeContext) -> Result<bool> {
        let mut spec = spec.clone();
        spec.resolve_placeholders(runtime);
        validate_condition(&spec)?;

        let handler = self
            .conditions
            .get(&spec.cond_type)
            .ok_or_else(|| DefinitionError::UnknownConditionType(spec.cond_type.clone()))?;
        let held = handler(&spec, runtime)?;
        Ok(held != spec.invert)
    }
}

/// Append `name` to the prefix's history log unless already present.
fn record_history(pfx_path: &Path, name: &str) -> Result<()> {
    let entries = read_history(pfx_path)?;
    if entries.iter().any(|e| e == name) {
        return Ok(());
    }

    let log = pfx_path.join(HISTORY_FILE);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log)
        .map_err(|source| TaskError::io(&log, source))?;
    writeln!(file, "{name}").map_err(|source| TaskError::io(&log, source))?;
    Ok(())
}

/// Tweak names recorded in the prefix's history log; a missing log reads
/// as empty.
pub fn read_history(pfx_path: &Path) -> Result<Vec<String>> {
    let log = pfx_path.join(HISTORY_FILE);
    match fs::read_to_string(&log) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(TaskError::io(log, source).into()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use crate::error::PrefixerError;

    use super::super::loader::load_tweaks;
    use super::super::test_helpers::make_runtime;
    use super::*;

    fn write_tweak(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(format!("{name}.json")), body).unwrap();
    }

    #[test]
    fn applies_tasks_in_order_and_records_history() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "notes",
            r#"{
                description: "drop two notes",
                tasks: [
                    { description: "first", type: "create", path: "<pfxdir>/one.txt", content: "1" },
                    { description: "second", type: "copy", path: "<pfxdir>/one.txt", new_path: "<pfxdir>/two.txt" },
                ],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let outcome = engine.run_tweak("notes", &runtime).unwrap();
        assert_eq!(outcome, TweakOutcome::Applied);
        assert!(pfx.path().join("one.txt").exists());
        assert!(pfx.path().join("two.txt").exists());
        assert_eq!(read_history(pfx.path()).unwrap(), ["notes"]);
    }

    #[test]
    fn history_is_deduplicated_across_runs() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "again",
            r#"{
                description: "idempotent",
                tasks: [{ description: "touch", type: "create", path: "<pfxdir>/f", content: "x" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        engine.run_tweak("again", &runtime).unwrap();
        engine.run_tweak("again", &runtime).unwrap();
        assert_eq!(read_history(pfx.path()).unwrap(), ["again"]);
    }

    #[test]
    fn failed_tweak_condition_skips_silently() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "gated",
            r#"{
                description: "never runs",
                conditions: [{ type: "file_exists", filename: "<pfxdir>/missing-marker" }],
                tasks: [{ description: "touch", type: "create", path: "<pfxdir>/f", content: "x" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let outcome = engine.run_tweak("gated", &runtime).unwrap();
        assert_eq!(outcome, TweakOutcome::Skipped);
        assert!(!pfx.path().join("f").exists());
        assert!(read_history(pfx.path()).unwrap().is_empty());
    }

    #[test]
    fn failed_task_condition_skips_only_that_task() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "partial",
            r#"{
                description: "one of two",
                tasks: [
                    {
                        description: "guarded",
                        type: "create",
                        path: "<pfxdir>/guarded",
                        content: "x",
                        conditions: [{ type: "file_exists", filename: "<pfxdir>/missing" }],
                    },
                    { description: "always", type: "create", path: "<pfxdir>/always", content: "x" },
                ],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let outcome = engine.run_tweak("partial", &runtime).unwrap();
        assert_eq!(outcome, TweakOutcome::Applied);
        assert!(!pfx.path().join("guarded").exists());
        assert!(pfx.path().join("always").exists());
    }

    #[test]
    fn inverted_conditions_flip_the_result() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "inverted",
            r#"{
                description: "runs only when the marker is absent",
                conditions: [{ type: "file_exists", filename: "<pfxdir>/marker", invert: true }],
                tasks: [{ description: "touch", type: "create", path: "<pfxdir>/made", content: "x" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        assert_eq!(
            engine.run_tweak("inverted", &runtime).unwrap(),
            TweakOutcome::Applied
        );

        fs::write(pfx.path().join("marker"), "x").unwrap();
        assert_eq!(
            engine.run_tweak("inverted", &runtime).unwrap(),
            TweakOutcome::Skipped
        );
    }

    #[test]
    fn handler_error_aborts_remaining_tasks() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "failing",
            r#"{
                description: "first task fails",
                tasks: [
                    { description: "bad", type: "delete", path: "<pfxdir>/does-not-exist" },
                    { description: "never reached", type: "create", path: "<pfxdir>/later", content: "x" },
                ],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let err = engine.run_tweak("failing", &runtime).unwrap_err();
        assert!(matches!(err, PrefixerError::Task(_)));
        assert!(!pfx.path().join("later").exists());
        assert!(read_history(pfx.path()).unwrap().is_empty());
    }

    #[test]
    fn nested_tweaks_run_through_the_engine() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "outer",
            r#"{
                description: "delegates",
                tasks: [{ description: "invoke inner", type: "tweak", name: "inner" }],
            }"#,
        );
        write_tweak(
            defs.path(),
            "inner",
            r#"{
                description: "does the work",
                tasks: [{ description: "touch", type: "create", path: "<pfxdir>/inner-made", content: "x" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        engine.run_tweak("outer", &runtime).unwrap();
        assert!(pfx.path().join("inner-made").exists());
        // only the tweak the user asked for lands in the history
        assert_eq!(read_history(pfx.path()).unwrap(), ["outer"]);
    }

    #[test]
    fn recursion_loops_are_detected() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "a",
            r#"{
                description: "calls b",
                tasks: [{ description: "b", type: "tweak", name: "b" }],
            }"#,
        );
        write_tweak(
            defs.path(),
            "b",
            r#"{
                description: "calls a",
                tasks: [{ description: "a", type: "tweak", name: "a" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let err = engine.run_tweak("a", &runtime).unwrap_err();
        assert!(matches!(
            err,
            PrefixerError::Definition(DefinitionError::RecursionLoop { chain }) if chain == "a -> b -> a"
        ));
    }

    #[test]
    fn unknown_task_type_fails_the_run() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "odd",
            r#"{
                description: "bogus type",
                tasks: [{ description: "x", type: "teleport" }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let err = engine.run_tweak("odd", &runtime).unwrap_err();
        assert!(matches!(
            err,
            PrefixerError::Definition(DefinitionError::UnknownTaskType(t)) if t == "teleport"
        ));
    }

    #[test]
    fn field_contract_violations_fail_before_dispatch() {
        let pfx = tempfile::tempdir().unwrap();
        let defs = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(pfx.path());

        write_tweak(
            defs.path(),
            "overfull",
            r#"{
                description: "copy with a spurious url",
                tasks: [{
                    description: "x",
                    type: "copy",
                    path: "/a",
                    new_path: "/b",
                    url: "https://example.com",
                }],
            }"#,
        );

        let set = load_tweaks(&[defs.path().to_path_buf()]).unwrap();
        let engine = Engine::new(&set);
        let err = engine.run_tweak("overfull", &runtime).unwrap_err();
        assert!(matches!(
            err,
            PrefixerError::Definition(DefinitionError::FieldContract { .. })
        ));
    }
}
