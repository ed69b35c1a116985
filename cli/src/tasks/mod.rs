//! Install steps and the orchestrator that sequences them.
pub mod casks;
pub mod context;
pub mod dry_run;
pub mod formulas;
pub mod ledger;
pub mod orchestrator;
pub mod plan;
pub mod postinstall;
pub mod prereqs;
pub mod scan;
pub mod taps;
pub mod verify;

pub use context::{Context, DEFAULT_WORKERS, Settings};

use std::time::Instant;

use anyhow::Result;

use crate::classify::classify_error;
use crate::config::Package;
use ledger::{InstallResult, InstallStatus};

/// What a step reports when it finishes without an unexpected error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Terminal status.
    pub status: InstallStatus,
    /// Short outcome text.
    pub message: String,
    /// Error text; empty unless failed.
    pub error: String,
}

impl Outcome {
    /// Work was done.
    #[must_use]
    pub const fn installed() -> Self {
        Self {
            status: InstallStatus::Installed,
            message: String::new(),
            error: String::new(),
        }
    }

    /// Work was done; `message` adds detail.
    #[must_use]
    pub fn installed_with(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::installed()
        }
    }

    /// Nothing needed doing.
    #[must_use]
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: InstallStatus::Skipped,
            message: message.into(),
            error: String::new(),
        }
    }

    /// An expected failure the step describes itself (not classified).
    #[must_use]
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: InstallStatus::Failed,
            message: message.into(),
            error: error.into(),
        }
    }
}

/// A named unit of work recorded as exactly one ledger entry.
pub trait Step: Send + Sync {
    /// Ledger identity of this step.
    fn package(&self) -> Package;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error for unexpected failures; [`record`] classifies it.
    fn run(&self, ctx: &Context) -> Result<Outcome>;
}

/// Run a [`Step`], publishing progress and timing it.
pub fn execute(step: &dyn Step, ctx: &Context) -> InstallResult {
    record(ctx, &step.package(), || step.run(ctx))
}

/// Run `work` for `package`: publish `running`, time it, classify any error,
/// publish the terminal status, and return the ledger entry.
pub fn record(
    ctx: &Context,
    package: &Package,
    work: impl FnOnce() -> Result<Outcome>,
) -> InstallResult {
    ctx.progress.emit(package, InstallStatus::Running, "", "");
    let start = Instant::now();
    let outcome = work().unwrap_or_else(|e| {
        ctx.log.debug(&format!("{}: {e:#}", package.name));
        Outcome::failed("", classify_error(&package.name, &e).to_string())
    });
    let duration = start.elapsed();
    if ctx.settings.verbose {
        ctx.log.debug(&format!(
            "{} {} in {:.1}s",
            package.name,
            outcome.status,
            duration.as_secs_f64()
        ));
    }
    ctx.progress.emit(package, outcome.status, &outcome.message, &outcome.error);
    InstallResult {
        package: package.clone(),
        status: outcome.status,
        message: outcome.message,
        error: outcome.error,
        duration,
    }
}
