use anyhow::{Context as _, Result};

use super::super::{Context, Outcome, Step};
use super::{clone_if_missing, shell_task};
use crate::config::Package;
use crate::exec::CommandSpec;
use crate::resources::download::{OH_MY_ZSH_INSTALL_URL, download_script};

/// Plugins cloned into `~/.oh-my-zsh/custom/plugins`, by directory name.
pub const ZSH_PLUGINS: &[(&str, &str)] = &[
    (
        "zsh-autocomplete",
        "https://github.com/marlonrichert/zsh-autocomplete.git",
    ),
    (
        "zsh-autosuggestions",
        "https://github.com/zsh-users/zsh-autosuggestions.git",
    ),
    (
        "zsh-completions",
        "https://github.com/zsh-users/zsh-completions.git",
    ),
    (
        "zsh-syntax-highlighting",
        "https://github.com/zsh-users/zsh-syntax-highlighting.git",
    ),
];

/// Oh My Zsh, via its unattended installer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OhMyZsh;

impl Step for OhMyZsh {
    fn package(&self) -> Package {
        shell_task("Oh My Zsh")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if ctx.home().join(".oh-my-zsh").exists() {
            return Ok(Outcome::skipped("already installed"));
        }
        let script = download_script(ctx.executor.as_ref(), &ctx.cancel, OH_MY_ZSH_INSTALL_URL)?;
        let spec = CommandSpec::new("sh")
            .arg(script.display().to_string())
            .arg("--unattended");
        ctx.executor.run(&spec, &ctx.cancel)?;
        Ok(Outcome::installed())
    }
}

/// Every [`ZSH_PLUGINS`] entry, cloned only when missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZshPlugins;

impl Step for ZshPlugins {
    fn package(&self) -> Package {
        shell_task("Zsh plugins")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let plugins_dir = ctx.home().join(".oh-my-zsh/custom/plugins");
        if ZSH_PLUGINS
            .iter()
            .all(|(name, _)| plugins_dir.join(name).exists())
        {
            return Ok(Outcome::skipped("already installed"));
        }
        for (name, url) in ZSH_PLUGINS {
            clone_if_missing(ctx, url, plugins_dir.join(name))
                .with_context(|| format!("failed to clone {name}"))?;
        }
        Ok(Outcome::installed())
    }
}
