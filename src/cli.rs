use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the prefix tweak engine.
#[derive(Parser, Debug)]
#[command(
    name = "prefixer",
    about = "Declarative tweak engine for Wine and Proton prefixes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Target prefix root (defaults to $PREFIX_PATH, then ~/.wine)
    #[arg(short, long, global = true)]
    pub prefix: Option<PathBuf>,

    /// Working-files directory of the wrapped program
    #[arg(long, global = true)]
    pub program_dir: Option<PathBuf>,

    /// Wine binary or Proton script to run executables with
    #[arg(long, global = true)]
    pub runner_binary: Option<PathBuf>,

    /// Keep the scratch directory after the run
    #[arg(long, global = true)]
    pub keep_temp: bool,

    /// Never touch the network; downloads fall back to local files
    #[arg(long, global = true)]
    pub offline: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a tweak to the target prefix
    Apply(ApplyOpts),
    /// List available tweaks across all layers
    List,
    /// Run an executable inside the target prefix
    Run(RunOpts),
    /// Show prefix details, applied tweaks, and DLL overrides
    Info,
    /// Print version information
    Version,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyOpts {
    /// Name of the tweak to apply
    pub name: String,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Executable to run (a Windows path or a file inside the prefix)
    pub exe: String,

    /// Arguments passed through to the executable
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}
