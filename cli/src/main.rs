//! `macsetup` command-line entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use macsetup_cli::cli::{Cli, Command};
use macsetup_cli::commands;
use macsetup_cli::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match args.effective_command() {
        Command::Install => commands::install::run(&args.global, args.verbose, &logger(&args)),
        Command::List => commands::list::run(&args.global, args.verbose, &logger(&args)),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
        Command::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
    }
}

/// Install the tracing subscriber and build the console logger.
fn logger(args: &Cli) -> Arc<Logger> {
    let log_path = init_subscriber(args.verbose, args.global.log_file.as_deref());
    Arc::new(Logger::new(log_path))
}
