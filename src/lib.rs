//! Declarative tweak engine for Wine and Proton compatibility prefixes.
//!
//! A *tweak* is a named, ordered list of tasks (download, extract, copy,
//! registry-edit, run-executable, …) gated by optional conditions, loaded
//! from relaxed-JSON definition files and applied against a target prefix.
//!
//! The public API is organised into five layers:
//!
//! - **[`regedit`]** — parse and serialize the registry-export text format
//!   Wine uses as its persistent configuration store
//! - **[`paths`]** — drive-letter path resolution and tweak directory layout
//! - **[`prefix`]** — the target environment abstraction and its providers
//! - **[`tweaks`]** — definitions, the loader, registries, and the executor
//! - **[`commands`]** — top-level subcommand orchestration (`apply`, `list`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod logging;
pub mod paths;
pub mod prefix;
pub mod regedit;
pub mod tweaks;
