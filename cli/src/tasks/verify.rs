//! Final check that critical tools resolve and run.
use std::path::PathBuf;
use std::time::Duration;

use super::ledger::{InstallResult, InstallStatus};
use super::{Context, Outcome, record};
use crate::config::Package;
use crate::exec::CommandSpec;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One tool to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCheck {
    /// Executable name.
    pub program: &'static str,
    /// Arguments of a cheap invocation that must succeed.
    pub args: &'static [&'static str],
    /// Formula to relink when the executable is missing from `PATH`.
    pub formula: Option<&'static str>,
}

/// Tools every provisioned machine must have.
pub const CRITICAL_TOOLS: &[ToolCheck] = &[
    ToolCheck {
        program: "brew",
        args: &["--version"],
        formula: None,
    },
    ToolCheck {
        program: "git",
        args: &["--version"],
        formula: None,
    },
    ToolCheck {
        program: "nvim",
        args: &["--version"],
        formula: Some("neovim"),
    },
    ToolCheck {
        program: "tmux",
        args: &["-V"],
        formula: Some("tmux"),
    },
    ToolCheck {
        program: "mise",
        args: &["--version"],
        formula: Some("mise"),
    },
    ToolCheck {
        program: "starship",
        args: &["--version"],
        formula: Some("starship"),
    },
];

/// Outcome of one [`ToolCheck`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Tool that was checked.
    pub name: String,
    /// `None` when the tool passed.
    pub error: Option<String>,
}

/// The verification pass.
#[derive(Debug, Clone)]
pub struct Verifier {
    checks: Vec<ToolCheck>,
    /// Searched after `PATH`, since a Homebrew installed during this run is
    /// not on the inherited `PATH`.
    extra_dirs: Vec<PathBuf>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            checks: CRITICAL_TOOLS.to_vec(),
            extra_dirs: vec![
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/usr/local/bin"),
            ],
        }
    }
}

impl Verifier {
    /// Verify `checks`, resolving executables on `PATH` and in `extra_dirs`.
    #[must_use]
    pub const fn new(checks: Vec<ToolCheck>, extra_dirs: Vec<PathBuf>) -> Self {
        Self { checks, extra_dirs }
    }

    fn resolve(&self, ctx: &Context, program: &str) -> Option<PathBuf> {
        ctx.executor.which(program).or_else(|| {
            self.extra_dirs
                .iter()
                .map(|dir| dir.join(program))
                .find(|path| path.is_file())
        })
    }

    fn check(&self, ctx: &Context, check: &ToolCheck) -> Option<String> {
        let mut path = self.resolve(ctx, check.program);
        if path.is_none()
            && let Some(formula) = check.formula
        {
            match ctx.brew.link_once(formula) {
                Ok(()) => path = self.resolve(ctx, check.program),
                Err(e) => ctx.log.debug(&format!("relinking {formula}: {e}")),
            }
        }
        let Some(path) = path else {
            return Some("not found in PATH".to_string());
        };
        let spec = CommandSpec::new(path.display().to_string())
            .args(check.args.iter().copied())
            .timeout(PROBE_TIMEOUT);
        let outcome = if check.program == "brew" {
            ctx.brew.run(&spec)
        } else {
            ctx.executor.run(&spec, &ctx.cancel)
        };
        outcome.err().map(|e| e.to_string())
    }

    /// Run every check in order.
    #[must_use]
    pub fn check_all(&self, ctx: &Context) -> Vec<VerifyResult> {
        self.checks
            .iter()
            .map(|check| VerifyResult {
                name: check.program.to_string(),
                error: self.check(ctx, check),
            })
            .collect()
    }

    /// Run the pass and produce its ledger entries: one aggregate result
    /// followed by one failed result per failing tool.
    pub fn run(&self, ctx: &Context) -> Vec<InstallResult> {
        let mut checks = Vec::new();
        let aggregate = record(ctx, &Package::task("Post-install verification", "core"), || {
            checks = self.check_all(ctx);
            let failed = checks.iter().filter(|c| c.error.is_some()).count();
            if failed == 0 {
                Ok(Outcome::installed())
            } else {
                Ok(Outcome::failed(
                    "",
                    format!("{failed} failed verification checks"),
                ))
            }
        });

        let mut results = vec![aggregate];
        for check in checks {
            let Some(error) = check.error else { continue };
            let package = Package::task(format!("verify: {}", check.name), "core");
            ctx.progress.emit(&package, InstallStatus::Failed, "", &error);
            results.push(InstallResult {
                package,
                status: InstallStatus::Failed,
                message: String::new(),
                error,
                duration: Duration::ZERO,
            });
        }
        results
    }
}
