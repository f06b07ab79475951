//! Per-type field contracts for tasks and conditions.
//!
//! Each type tag declares the exact set of generic fields it consumes. A
//! spec carrying fewer fields (under-specification) or more
//! (over-specification) is malformed; both raise the same
//! [`DefinitionError::FieldContract`] kind.

use crate::error::DefinitionError;

use super::model::{ConditionSpec, TaskSpec};

/// Generic fields a task or condition spec may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `filename`
    Filename,
    /// `checksum`
    Checksum,
    /// `url`
    Url,
    /// `path`
    Path,
    /// `new_path`
    NewPath,
    /// `name`
    Name,
    /// `method`
    Method,
    /// `args`
    Args,
    /// `values`
    Values,
    /// `content`
    Content,
    /// `action`
    Action,
    /// `value`
    Value,
    /// `matches`
    Matches,
}

impl Field {
    /// The field's name as written in definition files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Checksum => "checksum",
            Self::Url => "url",
            Self::Path => "path",
            Self::NewPath => "new_path",
            Self::Name => "name",
            Self::Method => "method",
            Self::Args => "args",
            Self::Values => "values",
            Self::Content => "content",
            Self::Action => "action",
            Self::Value => "value",
            Self::Matches => "matches",
        }
    }
}

use Field::{
    Action, Args, Checksum, Content, Filename, Matches, Method, Name, NewPath, Path, Url, Value,
    Values,
};

/// Required field set per built-in task type.
const TASK_SCHEMAS: &[(&str, &[Field])] = &[
    ("copy", &[Path, NewPath]),
    ("create", &[Path, Content]),
    ("delete", &[Path]),
    ("download", &[Filename, Url, Checksum]),
    ("edit_ini", &[Values, Path, Filename]),
    ("extract", &[Path, Filename]),
    ("extract_cab", &[Path, Filename]),
    ("install_font", &[Filename, Name]),
    ("message", &[Content]),
    ("pause", &[]),
    ("regedit", &[Values, Path, Filename]),
    ("register_dll", &[Path]),
    ("rename", &[Path, NewPath]),
    ("run_exe", &[Path, Args]),
    ("text_replace", &[Path, Values]),
    ("tweak", &[Name]),
    ("wineserver", &[Action]),
];

/// Required field set per built-in condition type.
const CONDITION_SCHEMAS: &[(&str, &[Field])] = &[
    ("env_matches", &[Value, Matches]),
    ("file_exists", &[Filename]),
    ("file_matches", &[Filename, Matches]),
    ("reg_matches", &[Path, Filename, Values]),
];

/// Look up the field contract for a task type.
#[must_use]
pub fn task_fields(task_type: &str) -> Option<&'static [Field]> {
    TASK_SCHEMAS
        .iter()
        .find(|(tag, _)| *tag == task_type)
        .map(|(_, fields)| *fields)
}

/// Look up the field contract for a condition type.
#[must_use]
pub fn condition_fields(cond_type: &str) -> Option<&'static [Field]> {
    CONDITION_SCHEMAS
        .iter()
        .find(|(tag, _)| *tag == cond_type)
        .map(|(_, fields)| *fields)
}

/// Fields actually populated on a task spec.
///
/// An empty string, list, or map counts as absent.
fn present_task_fields(spec: &TaskSpec) -> Vec<Field> {
    let mut present = Vec::new();
    let strings = [
        (Filename, &spec.filename),
        (Checksum, &spec.checksum),
        (Url, &spec.url),
        (Path, &spec.path),
        (NewPath, &spec.new_path),
        (Name, &spec.name),
        (Method, &spec.method),
        (Content, &spec.content),
        (Action, &spec.action),
    ];
    for (field, value) in strings {
        if value.as_deref().is_some_and(|s| !s.is_empty()) {
            present.push(field);
        }
    }
    if spec.args.as_deref().is_some_and(|a| !a.is_empty()) {
        present.push(Args);
    }
    if spec.values.as_ref().is_some_and(|v| !v.is_empty()) {
        present.push(Values);
    }
    present
}

/// Fields actually populated on a condition spec.
fn present_condition_fields(spec: &ConditionSpec) -> Vec<Field> {
    let mut present = Vec::new();
    let strings = [
        (Value, &spec.value),
        (Matches, &spec.matches),
        (Path, &spec.path),
        (Filename, &spec.filename),
    ];
    for (field, value) in strings {
        if value.as_deref().is_some_and(|s| !s.is_empty()) {
            present.push(field);
        }
    }
    if spec.values.as_ref().is_some_and(|v| !v.is_empty()) {
        present.push(Values);
    }
    present
}

/// Check that exactly the required fields are populated.
fn check_exact(
    kind: &'static str,
    type_tag: &str,
    required: &[Field],
    present: &[Field],
) -> Result<(), DefinitionError> {
    let missing = required.iter().any(|f| !present.contains(f));
    let extra = present.iter().any(|f| !required.contains(f));
    if missing || extra {
        return Err(DefinitionError::FieldContract {
            kind,
            type_tag: type_tag.to_string(),
            expected: join(required),
            found: join(present),
        });
    }
    Ok(())
}

fn join(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a task spec against its type's field contract.
///
/// # Errors
///
/// Returns [`DefinitionError::UnknownTaskType`] for an unregistered type
/// tag and [`DefinitionError::FieldContract`] when the populated field set
/// differs from the required one in either direction.
pub fn validate_task(spec: &TaskSpec) -> Result<(), DefinitionError> {
    let required = task_fields(&spec.task_type)
        .ok_or_else(|| DefinitionError::UnknownTaskType(spec.task_type.clone()))?;
    check_exact("task", &spec.task_type, required, &present_task_fields(spec))
}

/// Validate a condition spec against its type's field contract.
///
/// # Errors
///
/// Returns [`DefinitionError::UnknownConditionType`] for an unregistered
/// type tag and [`DefinitionError::FieldContract`] on any field-set
/// mismatch.
pub fn validate_condition(spec: &ConditionSpec) -> Result<(), DefinitionError> {
    let required = condition_fields(&spec.cond_type)
        .ok_or_else(|| DefinitionError::UnknownConditionType(spec.cond_type.clone()))?;
    check_exact(
        "condition",
        &spec.cond_type,
        required,
        &present_condition_fields(spec),
    )
}
