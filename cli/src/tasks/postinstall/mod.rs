//! Fixed, ordered setup that runs after every package install.
//!
//! Each step is idempotent and self-skipping. A failed step is recorded and
//! the pipeline moves on; only cancellation stops it.
mod clones;
mod directories;
mod dotfiles;
mod fzf;
mod mise;
mod shell;

pub use clones::{NEOVIM_CONFIG_URL, NeovimConfig, TPM_URL, TmuxPluginManager};
pub use directories::{CONFIG_DIRS, ConfigDirectories};
pub use dotfiles::{DOTFILES, Dotfile, Dotfiles, render_template};
pub use fzf::ConfigureFzf;
pub use mise::{MISE_RUNTIMES, MiseRuntimes};
pub use shell::{OhMyZsh, ZSH_PLUGINS, ZshPlugins};

use std::path::PathBuf;

use anyhow::Result;

use super::ledger::InstallResult;
use super::{Context, Outcome, Step, execute};
use crate::config::Package;
use crate::resources::git::GitCloneResource;
use crate::resources::{Resource, ResourceChange};

/// Ledger entry for a postinstall step in the shell/CLI category.
fn shell_task(name: &str) -> Package {
    Package::task(name, "shell_cli")
}

/// Clone `url` to `dest` unless something is already there.
fn clone_if_missing(ctx: &Context, url: &str, dest: PathBuf) -> Result<Outcome> {
    let repo = GitCloneResource::new(url, dest, ctx.executor.as_ref(), &ctx.cancel);
    match repo.ensure()? {
        ResourceChange::AlreadyCorrect => Ok(Outcome::skipped("already installed")),
        ResourceChange::Skipped { reason } => Ok(Outcome::skipped(reason)),
        ResourceChange::Applied | ResourceChange::Replaced { .. } => {
            ctx.log.debug(&format!("cloned {}", repo.description()));
            Ok(Outcome::installed())
        }
    }
}

/// The pipeline, in run order.
#[must_use]
pub fn postinstall_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(ConfigDirectories),
        Box::new(OhMyZsh),
        Box::new(ZshPlugins),
        Box::new(NeovimConfig),
        Box::new(TmuxPluginManager),
        Box::new(MiseRuntimes),
        Box::new(Dotfiles),
        Box::new(ConfigureFzf),
    ]
}

/// Run every postinstall step, continuing past failures.
///
/// Steps not yet started when the run is cancelled get no ledger entry.
pub fn run_postinstall(ctx: &Context) -> Vec<InstallResult> {
    let mut results = Vec::new();
    for step in postinstall_steps() {
        if ctx.cancel.is_cancelled() {
            break;
        }
        results.push(execute(step.as_ref(), ctx));
    }
    results
}
