//! Tap registration, one tap at a time.
use anyhow::Result;

use super::ledger::InstallResult;
use super::{Context, Outcome, Step, execute};
use crate::config::Package;

/// Register one tap unless `brew tap` already lists it.
#[derive(Debug, Clone)]
pub struct TapStep {
    /// Tap catalog entry.
    pub package: Package,
}

impl TapStep {
    fn tap(&self) -> &str {
        self.package.tap_name().unwrap_or(&self.package.name)
    }
}

impl Step for TapStep {
    fn package(&self) -> Package {
        self.package.clone()
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let tap = self.tap();
        if ctx.brew.taps()?.contains(tap) {
            return Ok(Outcome::skipped("already tapped"));
        }
        ctx.brew.add_tap(tap)?;
        Ok(Outcome::installed())
    }
}

/// Register every tap in order, stopping early only on cancellation.
pub fn install_taps(ctx: &Context, taps: &[Package]) -> Vec<InstallResult> {
    let mut results = Vec::with_capacity(taps.len());
    for tap in taps {
        if ctx.cancel.is_cancelled() {
            break;
        }
        results.push(execute(
            &TapStep {
                package: tap.clone(),
            },
            ctx,
        ));
    }
    results
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Mechanism;
    use crate::tasks::ledger::InstallStatus;
    use crate::tasks::test_helpers::make_context;
    use crate::testing::ScriptedExecutor;

    fn tap(name: &str) -> Package {
        Package::new(name, Mechanism::Tap, "shell_cli").with_tap(name)
    }

    #[test]
    fn listed_tap_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new().ok("brew tap", "homebrew/bundle\nhashicorp/tap\n");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_taps(&ctx, &[tap("hashicorp/tap")]);
        assert_eq!(results[0].status, InstallStatus::Skipped);
        assert_eq!(results[0].message, "already tapped");
        assert_eq!(exec.count("brew tap hashicorp/tap"), 0);
    }

    #[test]
    fn missing_tap_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new()
            .ok("brew tap", "")
            .ok("brew tap hashicorp/tap", "");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_taps(&ctx, &[tap("hashicorp/tap")]);
        assert_eq!(results[0].status, InstallStatus::Installed);
        assert_eq!(exec.count("brew tap hashicorp/tap"), 1);
    }

    #[test]
    fn explicit_tap_name_is_used_over_entry_name() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new()
            .ok("brew tap", "")
            .ok("brew tap hashicorp/tap", "");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let pkg = Package::new("hashicorp", Mechanism::Tap, "devops").with_tap("hashicorp/tap");
        let results = install_taps(&ctx, &[pkg]);
        assert_eq!(results[0].package.name, "hashicorp");
        assert_eq!(exec.count("brew tap hashicorp/tap"), 1);
    }

    #[test]
    fn cancelled_run_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, exec, _rx) = make_context(dir.path(), ScriptedExecutor::new());
        ctx.cancel.cancel();
        assert!(install_taps(&ctx, &[tap("a/b"), tap("c/d")]).is_empty());
        assert!(exec.calls().is_empty());
    }
}
