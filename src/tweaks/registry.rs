//! Explicit dispatch registries for task and condition handlers.
//!
//! Registries are plain values constructed at engine start; there is no
//! global mutable state. [`TaskRegistry::builtin`] and
//! [`ConditionRegistry::builtin`] carry the built-in handlers, and callers
//! embedding the engine may register additional ones.

use std::collections::BTreeMap;

use crate::error::Result;

use super::context::RuntimeContext;
use super::model::{ConditionSpec, TaskSpec};
use super::{conditions, tasks};

/// A task handler: performs a side effect or fails.
pub type TaskHandler = fn(&TaskSpec, &RuntimeContext) -> Result<()>;

/// A condition handler: evaluates a predicate against the prefix.
pub type ConditionHandler = fn(&ConditionSpec, &RuntimeContext) -> Result<bool>;

/// Maps task type tags to handlers.
#[derive(Clone)]
pub struct TaskRegistry {
    handlers: BTreeMap<String, TaskHandler>,
}

impl TaskRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The built-in task handlers.
    ///
    /// The reserved `tweak` type is dispatched by the engine itself and has
    /// no entry here.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("copy", tasks::copy);
        registry.register("create", tasks::create);
        registry.register("delete", tasks::delete);
        registry.register("download", tasks::download);
        registry.register("edit_ini", tasks::edit_ini);
        registry.register("extract", tasks::extract);
        registry.register("extract_cab", tasks::extract_cab);
        registry.register("install_font", tasks::install_font);
        registry.register("message", tasks::message);
        registry.register("pause", tasks::pause);
        registry.register("regedit", tasks::regedit);
        registry.register("register_dll", tasks::register_dll);
        registry.register("rename", tasks::rename);
        registry.register("run_exe", tasks::run_exe);
        registry.register("text_replace", tasks::text_replace);
        registry.register("wineserver", tasks::wineserver);
        registry
    }

    /// Register or replace the handler for a type tag.
    pub fn register(&mut self, type_tag: impl Into<String>, handler: TaskHandler) {
        self.handlers.insert(type_tag.into(), handler);
    }

    /// Look up the handler for a type tag.
    #[must_use]
    pub fn get(&self, type_tag: &str) -> Option<TaskHandler> {
        self.handlers.get(type_tag).copied()
    }

    /// Registered type tags in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Maps condition type tags to handlers.
#[derive(Clone)]
pub struct ConditionRegistry {
    handlers: BTreeMap<String, ConditionHandler>,
}

impl ConditionRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The built-in condition handlers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("env_matches", conditions::env_matches);
        registry.register("file_exists", conditions::file_exists);
        registry.register("file_matches", conditions::file_matches);
        registry.register("reg_matches", conditions::reg_matches);
        registry
    }

    /// Register or replace the handler for a type tag.
    pub fn register(&mut self, type_tag: impl Into<String>, handler: ConditionHandler) {
        self.handlers.insert(type_tag.into(), handler);
    }

    /// Look up the handler for a type tag.
    #[must_use]
    pub fn get(&self, type_tag: &str) -> Option<ConditionHandler> {
        self.handlers.get(type_tag).copied()
    }

    /// Registered type tags in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
