//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Top-level CLI entry point for the workstation provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "macsetup",
    about = "Provision a macOS developer workstation with Homebrew",
    version
)]
pub struct Cli {
    /// Defaults to `install` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

impl Cli {
    /// The subcommand to run, falling back to `install`.
    #[must_use]
    pub fn effective_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Install)
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Run without the live progress line, printing one line per update
    #[arg(long, global = true)]
    pub headless: bool,

    /// Concurrent formula installs (0 selects the default)
    #[arg(long, global = true, default_value_t = crate::tasks::DEFAULT_WORKERS)]
    pub workers: usize,

    /// Preview changes without applying
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Write the debug log here instead of the cache directory
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Load the package catalog from a TOML file instead of the built-in one
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Add packages to the default selection
    #[arg(long, global = true, value_delimiter = ',', value_name = "NAMES")]
    pub with: Vec<String>,

    /// Remove packages from the default selection
    #[arg(long, global = true, value_delimiter = ',', value_name = "NAMES")]
    pub without: Vec<String>,

    /// Deselect optional packages that are already installed
    #[arg(long, global = true)]
    pub skip_installed: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install the selected packages and configure the shell
    Install,
    /// List catalog packages with their selection and installed state
    List,
    /// Print version information
    Version,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}
