use std::time::Duration;

use anyhow::{Context as _, Result};

use super::super::{Context, Outcome, Step};
use super::shell_task;
use crate::config::Package;
use crate::exec::CommandSpec;

/// Runtimes pinned globally with `mise use --global <name>@<version>`.
pub const MISE_RUNTIMES: &[(&str, &str)] =
    &[("node", "latest"), ("python", "latest"), ("go", "latest")];

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Language runtimes through mise, skipped when mise is not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiseRuntimes;

impl Step for MiseRuntimes {
    fn package(&self) -> Package {
        shell_task("Mise runtimes")
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let probe = CommandSpec::new("mise").arg("--version").timeout(PROBE_TIMEOUT);
        if let Err(e) = ctx.executor.run(&probe, &ctx.cancel) {
            if e.is_cancelled() {
                return Err(e.into());
            }
            return Ok(Outcome::skipped("mise not installed yet"));
        }
        for (name, version) in MISE_RUNTIMES {
            let spec = CommandSpec::new("mise")
                .args(["use", "--global"])
                .arg(format!("{name}@{version}"));
            ctx.executor
                .run(&spec, &ctx.cancel)
                .with_context(|| format!("failed to install {name}"))?;
        }
        Ok(Outcome::installed())
    }
}
