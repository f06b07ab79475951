//! Tweak definitions, the layered loader, dispatch registries, and the
//! execution engine.
//!
//! A tweak is loaded from a relaxed-JSON document into a
//! [`TweakDefinition`]: an ordered list of [`TaskSpec`]s gated by optional
//! [`ConditionSpec`]s. The [`Engine`] resolves placeholders, evaluates
//! conditions, and dispatches each task to its registered handler.

mod conditions;
mod context;
mod engine;
mod loader;
mod model;
mod registry;
mod schema;
mod tasks;

pub use context::RuntimeContext;
pub use engine::{Engine, HISTORY_FILE, NESTED_TWEAK_TYPE, TweakOutcome, read_history};
pub use loader::{TweakSet, load_tweaks};
pub use model::{ConditionSpec, TaskSpec, TweakDefinition};
pub use registry::{ConditionHandler, ConditionRegistry, TaskHandler, TaskRegistry};
pub use schema::{Field, condition_fields, task_fields, validate_condition, validate_task};
