//! Domain-specific error types for the tweak engine.
//!
//! Internal modules return typed errors through [`PrefixerError`] and the
//! crate-wide [`Result`] alias; command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! PrefixerError
//! ├── Definition(DefinitionError) — tweak lookup, field contracts, parse failures
//! ├── Task(TaskError)             — I/O, downloads, external processes
//! ├── Hive(HiveError)             — registry hive read/write failures
//! └── Prefix(PrefixError)         — drive mapping and environment discovery
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PrefixerError>;

/// Top-level error type for the tweak engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum PrefixerError {
    /// Tweak definition error (lookup, field contract, unparsable document).
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Task execution error (I/O, download, external process).
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// Registry hive codec error.
    #[error("registry hive error: {0}")]
    Hive(#[from] HiveError),

    /// Prefix path or discovery error.
    #[error("prefix error: {0}")]
    Prefix(#[from] PrefixError),
}

/// Errors that arise from tweak definitions and their lookup.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// No tweak with the given name exists in any layer.
    #[error("tweak '{0}' was not found")]
    UnknownTweak(String),

    /// A task references a type tag with no registered handler.
    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),

    /// A condition references a type tag with no registered handler.
    #[error("unknown condition type '{0}'")]
    UnknownConditionType(String),

    /// A task or condition carries the wrong field set for its declared type.
    ///
    /// Covers both under-specification (a required field is absent) and
    /// over-specification (an unrelated generic field is populated); the two
    /// are deliberately the same error kind.
    #[error(
        "{kind} of type '{type_tag}' must carry exactly the fields [{expected}], found [{found}]"
    )]
    FieldContract {
        /// `"task"` or `"condition"`.
        kind: &'static str,
        /// The declared type tag.
        type_tag: String,
        /// Comma-joined list of required field names.
        expected: String,
        /// Comma-joined list of populated field names.
        found: String,
    },

    /// A field is present but holds a value the task type cannot use.
    #[error("invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// What was expected instead.
        message: String,
    },

    /// The definition document is structurally invalid (unparsable, or an
    /// empty task list).
    #[error("tweak '{name}' is invalid: {message}")]
    Invalid {
        /// Name of the tweak whose document failed to load.
        name: String,
        /// Parse or structure failure detail.
        message: String,
    },

    /// A tweak transitively invoked itself.
    #[error("tweak recursion loop: {chain}")]
    RecursionLoop {
        /// The chain of tweak names, ` -> `-joined, ending in the repeat.
        chain: String,
    },

    /// An I/O error occurred while reading a definition file.
    #[error("failed to read tweak definition {path}: {source}")]
    Io {
        /// Path of the definition file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by task handlers during execution.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A file operation failed.
    #[error("I/O failure on {path}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An archive could not be read or extracted.
    #[error("corrupt or unreadable archive: {path}")]
    BadArchive {
        /// Path of the archive file.
        path: PathBuf,
    },

    /// A download failed at the network level.
    #[error("download of {url} failed: {message}")]
    Download {
        /// The URL that could not be fetched.
        url: String,
        /// Transport-level failure detail.
        message: String,
    },

    /// A downloaded file failed checksum verification and the user declined
    /// to keep it.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumRejected {
        /// Name of the rejected file.
        filename: String,
        /// Expected SHA-256 digest.
        expected: String,
        /// Computed SHA-256 digest.
        actual: String,
    },

    /// A required source file is absent (e.g. offline download fallback).
    #[error("required file not found: {path}")]
    MissingSource {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// The wrapped runtime exited abnormally while running an executable.
    #[error("external process '{program}' failed{}", code.map_or_else(String::new, |c| format!(" (exit {c})")))]
    Process {
        /// The program that was invoked.
        program: String,
        /// Exit code, when the process ran at all.
        code: Option<i32>,
    },
}

impl TaskError {
    /// Wrap an I/O error with the path it was acting on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the registry hive codec.
#[derive(Error, Debug)]
pub enum HiveError {
    /// The hive file could not be read or written.
    #[error("I/O failure on hive {path}: {source}")]
    Io {
        /// Path of the hive file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The hive is missing its two header lines.
    #[error("hive is truncated: fewer than two header lines")]
    Truncated,

    /// Strict-mode parse: a line matched no production of the grammar.
    #[error("unmatched line {line}: {content}")]
    UnmatchedLine {
        /// One-based line number.
        line: usize,
        /// The offending line text.
        content: String,
    },
}

/// Errors from prefix path resolution and environment discovery.
#[derive(Error, Debug)]
pub enum PrefixError {
    /// A Windows path was missing its drive separator.
    #[error("path '{0}' must be absolute (include a drive letter)")]
    NotAbsolute(String),

    /// The drive letter has no `dosdevices` symlink in this prefix.
    #[error("drive '{0}:' is not mapped in this prefix")]
    DriveNotMapped(String),

    /// A drive mapping exists but its target could not be resolved.
    #[error("drive mapping {path} could not be resolved: {source}")]
    DriveUnresolvable {
        /// Path of the `dosdevices` symlink.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No provider could supply a usable prefix.
    #[error("unable to locate a prefix: {0}")]
    Discovery(String),
}
