//! Homebrew client.
//!
//! Every invocation runs inside the run's [`BrewGate`], one attempt at a
//! time: retries release the gate while they sleep so other workers can
//! make progress.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serde::Deserialize;

use crate::cancel::CancelToken;
use crate::config::catalog::{Mechanism, Package};
use crate::error::ExecError;
use crate::exec::{CommandSpec, ExecResult, Executor};
use crate::gate::BrewGate;
use crate::retry::{RetryOptions, retry};

/// Install locations checked when `brew` is not on `PATH` (Apple silicon,
/// then Intel).
pub const FALLBACK_PATHS: &[&str] = &["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];

/// Deadline for `brew --version`.
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for state queries (`list`, `info`, `tap`, `--prefix`).
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for bulk listings.
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Subset of `brew info --json=v2` used for link checks.
#[derive(Debug, Default, Deserialize)]
struct InfoV2 {
    #[serde(default)]
    formulae: Vec<FormulaInfo>,
}

#[derive(Debug, Deserialize)]
struct FormulaInfo {
    name: String,
    #[serde(default)]
    linked_keg: Option<String>,
    #[serde(default)]
    keg_only: bool,
}

/// Gated, retrying access to the `brew` executable.
#[derive(Debug, Clone)]
pub struct Brew {
    executor: Arc<dyn Executor>,
    gate: Arc<BrewGate>,
    cancel: CancelToken,
}

impl Brew {
    /// Client whose calls all run under `gate`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, gate: Arc<BrewGate>, cancel: CancelToken) -> Self {
        Self {
            executor,
            gate,
            cancel,
        }
    }

    /// Path to `brew`: `PATH` first, then the standard install prefixes.
    ///
    /// Resolved on every call so a Homebrew installed earlier in the run is
    /// picked up.
    #[must_use]
    pub fn program(&self) -> String {
        if let Some(path) = self.executor.which("brew") {
            return path.display().to_string();
        }
        FALLBACK_PATHS
            .iter()
            .find(|p| Path::new(p).is_file())
            .map_or_else(|| "brew".to_string(), |p| (*p).to_string())
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(self.program()).args(args)
    }

    /// Run `spec` once under the gate.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] from the executor.
    pub fn run(&self, spec: &CommandSpec) -> Result<ExecResult, ExecError> {
        self.gate.with(|| self.executor.run(spec, &self.cancel))
    }

    /// Run with retries, taking the gate for each attempt only.
    fn run_retried(&self, spec: &CommandSpec, opts: RetryOptions) -> Result<ExecResult, ExecError> {
        retry(&self.cancel, opts, |_| self.run(spec))
    }

    /// Whether a working `brew` is reachable.
    #[must_use]
    pub fn is_present(&self) -> bool {
        let spec = self.command(["--version"]).timeout(VERSION_TIMEOUT);
        self.run(&spec).is_ok()
    }

    /// Whether a formula or cask is installed.
    ///
    /// A non-zero exit from `brew list` means "not installed"; spawn
    /// failures, timeouts and cancellation are errors.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] when the query itself could not run.
    pub fn is_installed(&self, pkg: &Package) -> Result<bool, ExecError> {
        let flag = pkg.mechanism.brew_flag().unwrap_or("--formula");
        let spec = self
            .command(["list", flag, pkg.name.as_str()])
            .timeout(QUERY_TIMEOUT);
        match self.run(&spec) {
            Ok(_) => Ok(true),
            Err(ExecError::Failed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether an installed formula has its executables linked into the
    /// prefix. Keg-only formulas count as linked.
    ///
    /// # Errors
    ///
    /// Returns an error if `brew info` fails or its JSON cannot be parsed.
    pub fn is_linked(&self, formula: &str) -> Result<bool> {
        let spec = self
            .command(["info", "--json=v2", "--formula", formula])
            .timeout(QUERY_TIMEOUT);
        let out = self.run(&spec)?;
        parse_linked(&out.stdout, formula)
    }

    /// `brew link --overwrite <formula>`.
    ///
    /// # Errors
    ///
    /// Returns the last [`ExecError`] once retries are exhausted.
    pub fn link(&self, formula: &str) -> Result<(), ExecError> {
        let spec = self.command(["link", "--overwrite", formula]);
        self.run_retried(&spec, RetryOptions::metadata()).map(drop)
    }

    /// `brew link --overwrite <formula>`, attempted exactly once.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] from the single attempt.
    pub fn link_once(&self, formula: &str) -> Result<(), ExecError> {
        let spec = self.command(["link", "--overwrite", formula]);
        self.run(&spec).map(drop)
    }

    /// Install a formula or cask.
    ///
    /// # Errors
    ///
    /// Returns the last [`ExecError`] once retries are exhausted.
    pub fn install(&self, pkg: &Package) -> Result<(), ExecError> {
        let spec = match pkg.mechanism {
            Mechanism::Cask => self.command(["install", "--cask", pkg.name.as_str()]),
            _ => self.command(["install", pkg.name.as_str()]),
        };
        self.run_retried(&spec, RetryOptions::network()).map(drop)
    }

    /// Names of registered taps.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] from `brew tap`.
    pub fn taps(&self) -> Result<BTreeSet<String>, ExecError> {
        let spec = self.command(["tap"]).timeout(QUERY_TIMEOUT);
        let out = self.run(&spec)?;
        Ok(lines(&out.stdout))
    }

    /// `brew tap <name>`.
    ///
    /// # Errors
    ///
    /// Returns the last [`ExecError`] once retries are exhausted.
    pub fn add_tap(&self, tap: &str) -> Result<(), ExecError> {
        let spec = self.command(["tap", tap]);
        self.run_retried(&spec, RetryOptions::metadata()).map(drop)
    }

    /// `brew update`.
    ///
    /// # Errors
    ///
    /// Returns the last [`ExecError`] once retries are exhausted.
    pub fn update(&self) -> Result<(), ExecError> {
        let spec = self.command(["update"]);
        self.run_retried(&spec, RetryOptions::metadata()).map(drop)
    }

    /// `brew upgrade`.
    ///
    /// # Errors
    ///
    /// Returns the last [`ExecError`] once retries are exhausted.
    pub fn upgrade(&self) -> Result<(), ExecError> {
        let spec = self.command(["upgrade"]);
        self.run_retried(&spec, RetryOptions::metadata()).map(drop)
    }

    /// Installed formulas or casks, one bulk query.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] from `brew list`.
    pub fn list(&self, mechanism: Mechanism) -> Result<BTreeSet<String>, ExecError> {
        let flag = mechanism.brew_flag().unwrap_or("--formula");
        let spec = self.command(["list", flag, "-1"]).timeout(LIST_TIMEOUT);
        let out = self.run(&spec)?;
        Ok(lines(&out.stdout))
    }

    /// `brew --prefix`.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] from the query.
    pub fn prefix(&self) -> Result<PathBuf, ExecError> {
        let spec = self.command(["--prefix"]).timeout(QUERY_TIMEOUT);
        let out = self.run(&spec)?;
        Ok(PathBuf::from(out.stdout.trim()))
    }
}

fn lines(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn parse_linked(json: &str, formula: &str) -> Result<bool> {
    let info: InfoV2 = serde_json::from_str(json).context("parsing brew info output")?;
    let entry = info
        .formulae
        .iter()
        .find(|f| f.name == formula)
        .or_else(|| info.formulae.first())
        .with_context(|| format!("brew info returned nothing for {formula}"))?;
    Ok(entry.keg_only || entry.linked_keg.is_some())
}
