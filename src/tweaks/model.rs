//! Tweak definition data model.
//!
//! Definitions are immutable after load; the engine works on per-task
//! clones whose string fields have had placeholders resolved.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::DefinitionError;

use super::context::RuntimeContext;

/// A named, ordered list of tasks with optional gating conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweakDefinition {
    /// Unique name within its directory layer (dotted-namespaced).
    pub name: String,
    /// Human-readable summary shown before the run.
    pub description: String,
    /// Tasks in execution order.
    pub tasks: Vec<TaskSpec>,
    /// Tweak-level conditions; any failure skips the whole tweak.
    pub conditions: Vec<ConditionSpec>,
}

/// One operation within a tweak.
///
/// Carries the union of all generic fields; exactly the subset relevant to
/// `type` must be populated (see [`super::schema`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    /// Description of this task.
    pub description: String,
    /// Dispatch key.
    #[serde(rename = "type")]
    pub task_type: String,
    /// File name; depends on task type.
    pub filename: Option<String>,
    /// SHA-256 checksum; depends on task type.
    pub checksum: Option<String>,
    /// Download URL; depends on task type.
    pub url: Option<String>,
    /// Generic path; depends on task type.
    pub path: Option<String>,
    /// Generic destination path; depends on task type.
    pub new_path: Option<String>,
    /// Generic name; depends on task type.
    pub name: Option<String>,
    /// Method of operation; depends on task type.
    pub method: Option<String>,
    /// Argument list; depends on task type.
    pub args: Option<Vec<String>>,
    /// Key-value pairs; depends on task type.
    pub values: Option<BTreeMap<String, String>>,
    /// Inline content; depends on task type.
    pub content: Option<String>,
    /// Action selector; depends on task type.
    pub action: Option<String>,
    /// Conditions gating this task only.
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
}

/// A named boolean predicate, optionally inverted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionSpec {
    /// Dispatch key.
    #[serde(rename = "type")]
    pub cond_type: String,
    /// Negate the handler's result.
    #[serde(default)]
    pub invert: bool,
    /// Generic value; depends on condition type.
    pub value: Option<String>,
    /// Comparison operand; depends on condition type.
    pub matches: Option<String>,
    /// Generic path; depends on condition type.
    pub path: Option<String>,
    /// File name; depends on condition type.
    pub filename: Option<String>,
    /// Expected key-value pairs; depends on condition type.
    pub values: Option<BTreeMap<String, String>>,
}

/// Pull a required, non-empty string field out of a spec.
fn require<'a>(
    field: &'a Option<String>,
    name: &'static str,
    kind: &'static str,
    type_tag: &str,
) -> Result<&'a str, DefinitionError> {
    field
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DefinitionError::FieldContract {
            kind,
            type_tag: type_tag.to_string(),
            expected: name.to_string(),
            found: "nothing".to_string(),
        })
}

impl TaskSpec {
    /// Substitute placeholders into the path-carrying string fields.
    ///
    /// Applies to `filename`, `path`, `new_path`, `content`, and each
    /// element of `args`; identity fields (`url`, `checksum`, `name`,
    /// `method`, `action`) and `values` are left untouched.
    pub fn resolve_placeholders(&mut self, runtime: &RuntimeContext) {
        for field in [
            &mut self.filename,
            &mut self.path,
            &mut self.new_path,
            &mut self.content,
        ] {
            if let Some(v) = field {
                *v = runtime.expand(v);
            }
        }
        if let Some(args) = &mut self.args {
            for arg in args {
                *arg = runtime.expand(arg);
            }
        }
    }

    /// The `filename` field, required to be present.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::FieldContract`] when the field is absent;
    /// unreachable after schema validation.
    pub fn filename(&self) -> Result<&str, DefinitionError> {
        require(&self.filename, "filename", "task", &self.task_type)
    }

    /// The `checksum` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn checksum(&self) -> Result<&str, DefinitionError> {
        require(&self.checksum, "checksum", "task", &self.task_type)
    }

    /// The `url` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn url(&self) -> Result<&str, DefinitionError> {
        require(&self.url, "url", "task", &self.task_type)
    }

    /// The `path` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn path(&self) -> Result<&str, DefinitionError> {
        require(&self.path, "path", "task", &self.task_type)
    }

    /// The `new_path` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn new_path(&self) -> Result<&str, DefinitionError> {
        require(&self.new_path, "new_path", "task", &self.task_type)
    }

    /// The `name` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn name(&self) -> Result<&str, DefinitionError> {
        require(&self.name, "name", "task", &self.task_type)
    }

    /// The `content` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn content(&self) -> Result<&str, DefinitionError> {
        require(&self.content, "content", "task", &self.task_type)
    }

    /// The `action` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn action(&self) -> Result<&str, DefinitionError> {
        require(&self.action, "action", "task", &self.task_type)
    }

    /// The `args` field, required to be present and non-empty.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn args(&self) -> Result<&[String], DefinitionError> {
        self.args
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| DefinitionError::FieldContract {
                kind: "task",
                type_tag: self.task_type.clone(),
                expected: "args".to_string(),
                found: "nothing".to_string(),
            })
    }

    /// The `values` field, required to be present and non-empty.
    ///
    /// # Errors
    ///
    /// See [`Self::filename`].
    pub fn values(&self) -> Result<&BTreeMap<String, String>, DefinitionError> {
        self.values
            .as_ref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DefinitionError::FieldContract {
                kind: "task",
                type_tag: self.task_type.clone(),
                expected: "values".to_string(),
                found: "nothing".to_string(),
            })
    }
}

impl ConditionSpec {
    /// Substitute placeholders into every string-valued field.
    pub fn resolve_placeholders(&mut self, runtime: &RuntimeContext) {
        for field in [
            &mut self.value,
            &mut self.matches,
            &mut self.path,
            &mut self.filename,
        ] {
            if let Some(v) = field {
                *v = runtime.expand(v);
            }
        }
    }

    /// The `value` field, required to be present.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::FieldContract`] when the field is absent;
    /// unreachable after schema validation.
    pub fn value(&self) -> Result<&str, DefinitionError> {
        require(&self.value, "value", "condition", &self.cond_type)
    }

    /// The `matches` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::value`].
    pub fn matches(&self) -> Result<&str, DefinitionError> {
        require(&self.matches, "matches", "condition", &self.cond_type)
    }

    /// The `path` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::value`].
    pub fn path(&self) -> Result<&str, DefinitionError> {
        require(&self.path, "path", "condition", &self.cond_type)
    }

    /// The `filename` field, required to be present.
    ///
    /// # Errors
    ///
    /// See [`Self::value`].
    pub fn filename(&self) -> Result<&str, DefinitionError> {
        require(&self.filename, "filename", "condition", &self.cond_type)
    }

    /// The `values` field, required to be present and non-empty.
    ///
    /// # Errors
    ///
    /// See [`Self::value`].
    pub fn values(&self) -> Result<&BTreeMap<String, String>, DefinitionError> {
        self.values
            .as_ref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DefinitionError::FieldContract {
                kind: "condition",
                type_tag: self.cond_type.clone(),
                expected: "values".to_string(),
                found: "nothing".to_string(),
            })
    }
}
