//! Result ledger: per-step statuses and the run summary.
use std::fmt;
use std::time::Duration;

use crate::config::Package;

/// Lifecycle state of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStatus {
    /// Planned, not started.
    Pending,
    /// In progress.
    Running,
    /// Changed the machine.
    Installed,
    /// Already in place, or not applicable.
    Skipped,
    /// Could not be completed.
    Failed,
}

impl InstallStatus {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Installed => "installed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Installed, skipped, and failed are terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Installed | Self::Skipped | Self::Failed)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one step, appended to the ledger once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    /// Step identity.
    pub package: Package,
    /// Terminal status.
    pub status: InstallStatus,
    /// Short outcome text.
    pub message: String,
    /// Classified error text; empty unless `status` is failed.
    pub error: String,
    /// Wall time spent in the step.
    pub duration: Duration,
}

/// Ordered results of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// One entry per step, in completion order.
    pub results: Vec<InstallResult>,
}

impl Summary {
    /// Number of failed results.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(InstallStatus::Failed)
    }

    /// Number of results with `status`.
    #[must_use]
    pub fn count(&self, status: InstallStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Find the result for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InstallResult> {
        self.results.iter().find(|r| r.package.name == name)
    }

    /// Result names in ledger order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.package.name.as_str()).collect()
    }

    pub(crate) fn push(&mut self, result: InstallResult) {
        self.results.push(result);
    }

    pub(crate) fn extend(&mut self, results: impl IntoIterator<Item = InstallResult>) {
        self.results.extend(results);
    }
}
