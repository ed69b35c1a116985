use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::SecondsFormat;

use super::super::{Context, Outcome, Step};
use super::shell_task;
use crate::config::Package;
use crate::resources::fs::{FileResource, SymlinkResource};
use crate::resources::{Resource, ResourceChange};

/// A configuration file shipped with the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dotfile {
    /// Template name under `conf/templates`.
    pub template: &'static str,
    /// Template text.
    pub content: &'static str,
    /// Destination relative to the home directory.
    pub dest: &'static str,
}

/// Files written by [`Dotfiles`], in write order.
pub const DOTFILES: &[Dotfile] = &[
    Dotfile {
        template: "zshrc.tmpl",
        content: include_str!("../../../../conf/templates/zshrc.tmpl"),
        dest: ".zshrc",
    },
    Dotfile {
        template: "starship.toml",
        content: include_str!("../../../../conf/templates/starship.toml"),
        dest: ".config/starship/starship.toml",
    },
    Dotfile {
        template: "alacritty.toml",
        content: include_str!("../../../../conf/templates/alacritty.toml"),
        dest: ".config/alacritty/alacritty.toml",
    },
    Dotfile {
        template: "ghostty.conf",
        content: include_str!("../../../../conf/templates/ghostty.conf"),
        dest: ".config/ghostty/config",
    },
    Dotfile {
        template: "tmux.conf",
        content: include_str!("../../../../conf/templates/tmux.conf"),
        dest: ".config/tmux/tmux.conf",
    },
    Dotfile {
        template: "zellij.kdl",
        content: include_str!("../../../../conf/templates/zellij.kdl"),
        dest: ".config/zellij/config.kdl",
    },
];

const TIMESTAMP_PLACEHOLDER: &str = "{{timestamp}}";

/// Substitute `{{timestamp}}` in `template`.
///
/// # Examples
///
/// ```
/// use macsetup_cli::tasks::postinstall::render_template;
///
/// let out = render_template("# Generated on {{timestamp}}", "2025-01-02T03:04:05+00:00");
/// assert_eq!(out, "# Generated on 2025-01-02T03:04:05+00:00");
/// ```
#[must_use]
pub fn render_template(template: &str, timestamp: &str) -> String {
    template.replace(TIMESTAMP_PLACEHOLDER, timestamp)
}

/// Write [`DOTFILES`] with backups and link `~/.tmux.conf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dotfiles;

impl Dotfiles {
    fn resources(home: &std::path::Path) -> Vec<FileResource> {
        let now = chrono::Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        DOTFILES
            .iter()
            .map(|f| FileResource::new(home.join(f.dest), render_template(f.content, &now)))
            .collect()
    }
}

impl Step for Dotfiles {
    fn package(&self) -> Package {
        shell_task("Dotfiles")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let mut backups: Vec<PathBuf> = Vec::new();
        for file in Self::resources(ctx.home()) {
            match file.ensure()? {
                ResourceChange::Replaced { backup } => {
                    ctx.log.debug(&format!(
                        "wrote {} (previous saved as {})",
                        file.description(),
                        backup.display()
                    ));
                    backups.push(backup);
                }
                ResourceChange::Applied => {
                    ctx.log.debug(&format!("wrote {}", file.description()));
                }
                ResourceChange::Skipped { reason } => anyhow::bail!(reason),
                ResourceChange::AlreadyCorrect => {}
            }
        }

        let tmux = SymlinkResource::new(
            ctx.config_dir().join("tmux/tmux.conf"),
            ctx.home().join(".tmux.conf"),
        );
        tmux.ensure().context("failed to create tmux symlink")?;

        if backups.is_empty() {
            Ok(Outcome::installed())
        } else {
            Ok(Outcome::installed_with(format!(
                "backed up {} file(s)",
                backups.len()
            )))
        }
    }
}
