//! Core prerequisite steps that precede every package install.
use std::time::Duration;

use anyhow::Result;

use super::{Context, Outcome, Step};
use crate::config::{Mechanism, Package};
use crate::error::Cancelled;
use crate::exec::CommandSpec;
use crate::resources::download::{HOMEBREW_INSTALL_URL, download_script};

const XCODE_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const XCODE_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn core_package(name: &str, mechanism: Mechanism) -> Package {
    Package::new(name, mechanism, "core").required()
}

/// Whether `xcode-select -p` reports an active developer directory.
#[must_use]
pub fn xcode_installed(ctx: &Context) -> bool {
    let spec = CommandSpec::new("xcode-select")
        .arg("-p")
        .timeout(XCODE_PROBE_TIMEOUT);
    ctx.executor.run(&spec, &ctx.cancel).is_ok()
}

/// Xcode Command Line Tools.
///
/// The installer is a GUI dialog; after triggering it the step polls until
/// the tools appear or the run is cancelled.
#[derive(Debug, Clone, Copy)]
pub struct XcodeCliTools {
    poll_interval: Duration,
}

impl Default for XcodeCliTools {
    fn default() -> Self {
        Self {
            poll_interval: XCODE_POLL_INTERVAL,
        }
    }
}

impl XcodeCliTools {
    /// Poll for the tools every `poll_interval` while the installer runs.
    #[must_use]
    pub const fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    fn wait(&self, ctx: &Context) -> Result<(), Cancelled> {
        loop {
            if xcode_installed(ctx) {
                return Ok(());
            }
            ctx.cancel.sleep(self.poll_interval)?;
        }
    }
}

impl Step for XcodeCliTools {
    fn package(&self) -> Package {
        core_package("Xcode CLI Tools", Mechanism::System)
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if xcode_installed(ctx) {
            return Ok(Outcome::skipped("already installed"));
        }
        // Exits non-zero when an install is already pending; polling decides.
        if let Err(e) = ctx
            .executor
            .run(&CommandSpec::new("xcode-select").arg("--install"), &ctx.cancel)
        {
            if e.is_cancelled() {
                return Err(e.into());
            }
            ctx.log.debug(&format!("xcode-select --install: {e}"));
        }
        ctx.log.info("waiting for the Xcode Command Line Tools installer to finish");
        self.wait(ctx)?;
        Ok(Outcome::installed())
    }
}

/// Homebrew itself, via the official install script.
#[derive(Debug, Clone, Copy, Default)]
pub struct Homebrew;

impl Step for Homebrew {
    fn package(&self) -> Package {
        core_package("Homebrew", Mechanism::System)
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if ctx.brew.is_present() {
            return Ok(Outcome::skipped("already installed"));
        }
        let script = download_script(ctx.executor.as_ref(), &ctx.cancel, HOMEBREW_INSTALL_URL)?;
        // The installer may prompt for a password.
        let spec = CommandSpec::new("/bin/bash")
            .arg(script.display().to_string())
            .interactive();
        ctx.executor.run(&spec, &ctx.cancel)?;
        Ok(Outcome::installed())
    }
}

/// `brew update` then `brew upgrade`.
///
/// A failed update is not fatal; a failed upgrade is.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomebrewUpdate;

impl Step for HomebrewUpdate {
    fn package(&self) -> Package {
        core_package("Homebrew update", Mechanism::Task)
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        if let Err(e) = ctx.brew.update() {
            if e.is_cancelled() {
                return Err(e.into());
            }
            ctx.log.warn(&format!("brew update: {e}"));
            return Ok(Outcome::skipped("update failed (non-critical)"));
        }
        ctx.brew.upgrade()?;
        Ok(Outcome::installed())
    }
}

/// The core steps, in run order.
#[must_use]
pub fn core_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(XcodeCliTools::default()),
        Box::new(Homebrew),
        Box::new(HomebrewUpdate),
    ]
}
