use anyhow::Result;

use super::super::{Context, Outcome, Step};
use super::{clone_if_missing, shell_task};
use crate::config::Package;

/// kickstart.nvim starter configuration.
pub const NEOVIM_CONFIG_URL: &str = "https://github.com/nvim-lua/kickstart.nvim.git";

/// tmux plugin manager.
pub const TPM_URL: &str = "https://github.com/tmux-plugins/tpm";

/// Clone kickstart.nvim into `~/.config/nvim` unless it exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeovimConfig;

impl Step for NeovimConfig {
    fn package(&self) -> Package {
        shell_task("Neovim config (kickstart)")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        clone_if_missing(ctx, NEOVIM_CONFIG_URL, ctx.config_dir().join("nvim"))
    }
}

/// Clone TPM into `~/.config/tmux/plugins/tpm` unless it exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TmuxPluginManager;

impl Step for TmuxPluginManager {
    fn package(&self) -> Package {
        shell_task("tmux plugin manager (TPM)")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        clone_if_missing(ctx, TPM_URL, ctx.config_dir().join("tmux/plugins/tpm"))
    }
}
