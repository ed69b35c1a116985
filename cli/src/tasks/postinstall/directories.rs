use anyhow::Result;

use super::super::{Context, Outcome, Step};
use crate::config::Package;
use crate::resources::fs::DirectoryResource;
use crate::resources::{Resource, ResourceChange};

/// Directories under `~/.config` that later steps and tools write into.
///
/// `nvim` is deliberately absent: the editor config step treats an existing
/// directory as already configured.
pub const CONFIG_DIRS: &[&str] = &[
    "starship",
    "alacritty",
    "ghostty",
    "tmux/plugins",
    "zellij",
    "mise",
    "1Password/ssh",
    "op",
];

/// Create every [`CONFIG_DIRS`] entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigDirectories;

impl Step for ConfigDirectories {
    fn package(&self) -> Package {
        Package::task("Create config directories", "core")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let base = ctx.config_dir();
        let mut created = 0usize;
        for rel in CONFIG_DIRS {
            let dir = DirectoryResource::new(base.join(rel));
            match dir.ensure()? {
                ResourceChange::Applied => {
                    ctx.log.debug(&format!("created {}", dir.description()));
                    created += 1;
                }
                ResourceChange::Skipped { reason } => anyhow::bail!(reason),
                ResourceChange::AlreadyCorrect | ResourceChange::Replaced { .. } => {}
            }
        }
        if created == 0 {
            return Ok(Outcome::skipped("already present"));
        }
        Ok(Outcome::installed())
    }
}
