use anyhow::Result;

use super::super::{Context, Outcome, Step};
use super::shell_task;
use crate::config::{Mechanism, Package};
use crate::exec::CommandSpec;

/// fzf shell integration via the formula's own install script.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigureFzf;

impl Step for ConfigureFzf {
    fn package(&self) -> Package {
        shell_task("Configure fzf")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if ctx.home().join(".fzf.zsh").exists() {
            return Ok(Outcome::skipped("already configured"));
        }
        let fzf = Package::new("fzf", Mechanism::Formula, "shell_cli");
        if !ctx.brew.is_installed(&fzf)? {
            return Ok(Outcome::skipped("fzf not installed"));
        }
        let script = ctx.brew.prefix()?.join("opt/fzf/install");
        let spec = CommandSpec::new(script.display().to_string()).args([
            "--all",
            "--no-bash",
            "--no-fish",
        ]);
        ctx.executor.run(&spec, &ctx.cancel)?;
        Ok(Outcome::installed())
    }
}
