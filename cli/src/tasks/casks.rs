//! Cask installs, strictly one after another.
//!
//! GUI installers contend for shared installer UI, so casks never run on the
//! formula pool.
use anyhow::Result;

use super::ledger::InstallResult;
use super::{Context, Outcome, Step, execute};
use crate::config::Package;
use crate::resources::apps::find_app_bundle;

/// Install one cask unless brew or the filesystem already has it.
#[derive(Debug, Clone)]
pub struct CaskStep {
    /// Cask catalog entry.
    pub package: Package,
}

impl Step for CaskStep {
    fn package(&self) -> Package {
        self.package.clone()
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if ctx.brew.is_installed(&self.package)? {
            return Ok(Outcome::skipped("already installed"));
        }
        if let Some(bundle) = find_app_bundle(&self.package.name, &ctx.settings.app_dirs) {
            return Ok(Outcome::skipped(format!(
                "already installed at {}",
                bundle.display()
            )));
        }
        ctx.brew.install(&self.package)?;
        Ok(Outcome::installed())
    }
}

/// Install every cask in order, stopping early only on cancellation.
pub fn install_casks(ctx: &Context, casks: &[Package]) -> Vec<InstallResult> {
    let mut results = Vec::with_capacity(casks.len());
    for cask in casks {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let step = CaskStep {
            package: cask.clone(),
        };
        results.push(execute(&step, ctx));
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

    fn cask(name: &str) -> Package {
        Package::new(name, Mechanism::Cask, "terminals")
    }

    #[test]
    fn brew_installed_cask_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new().ok("brew list --cask ghostty", "");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_casks(&ctx, &[cask("ghostty")]);
        assert_eq!(results[0].status, InstallStatus::Skipped);
        assert_eq!(results[0].message, "already installed");
        assert_eq!(exec.count("brew install --cask ghostty"), 0);
    }

    #[test]
    fn manually_installed_bundle_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Applications").join("iTerm.app");
        std::fs::create_dir_all(&bundle).unwrap();
        let exec = ScriptedExecutor::new().fail("brew list --cask iterm2", "Error: No such keg");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_casks(&ctx, &[cask("iterm2")]);
        assert_eq!(results[0].status, InstallStatus::Skipped);
        assert_eq!(
            results[0].message,
            format!("already installed at {}", bundle.display())
        );
        assert_eq!(exec.count("brew install --cask iterm2"), 0);
    }

    #[test]
    fn absent_cask_is_installed() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new()
            .fail("brew list --cask alacritty", "Error: No such keg")
            .ok("brew install --cask alacritty", "");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_casks(&ctx, &[cask("alacritty")]);
        assert_eq!(results[0].status, InstallStatus::Installed);
        assert_eq!(exec.count("brew install --cask alacritty"), 1);
    }

    #[test]
    fn casks_run_in_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new()
            .ok("brew list --cask alacritty", "")
            .ok("brew list --cask zoom", "");
        let (ctx, exec, _rx) = make_context(dir.path(), exec);
        let results = install_casks(&ctx, &[cask("alacritty"), cask("zoom")]);
        assert_eq!(results.len(), 2);
        assert_eq!(
            exec.calls(),
            vec!["brew list --cask alacritty", "brew list --cask zoom"]
        );
    }
}
