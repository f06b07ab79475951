use anyhow::Result;
use clap::Parser;

use prefixer_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    match args.command {
        cli::Command::Apply(opts) => commands::apply::run(&args.global, &opts),
        cli::Command::List => commands::list::run(),
        cli::Command::Run(opts) => commands::run::run(&args.global, &opts),
        cli::Command::Info => commands::info::run(&args.global),
        cli::Command::Version => {
            let version = option_env!("PREFIXER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("prefixer {version}");
            Ok(())
        }
    }
}
