// Shared helpers for integration tests.
//
// Provides a fake machine that answers brew, git, and installer commands
// from an in-memory description, an executor that records every call and
// the peak number of concurrent brew invocations, and a builder for an
// orchestrator rooted in a temporary home directory.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use macsetup_cli::cancel::CancelToken;
use macsetup_cli::config::{Catalog, Mechanism, Package};
use macsetup_cli::error::ExecError;
use macsetup_cli::exec::{CommandSpec, ExecResult, Executor};
use macsetup_cli::logging::NullLog;
use macsetup_cli::progress::ProgressUpdate;
use macsetup_cli::tasks::Settings;
use macsetup_cli::tasks::orchestrator::Orchestrator;
use macsetup_cli::tasks::verify::Verifier;

/// What the fake machine already has.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    /// Installed formulas.
    pub formulas: BTreeSet<String>,
    /// Installed formulas whose executables are not linked.
    pub unlinked: BTreeSet<String>,
    /// Formulas whose `brew link` fails.
    pub link_fails: BTreeSet<String>,
    /// Installed casks.
    pub casks: BTreeSet<String>,
    /// Registered taps.
    pub taps: BTreeSet<String>,
    /// Formulas whose `brew install` fails, with the error text.
    pub install_fails: Vec<(String, String)>,
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

impl Machine {
    pub fn with_formulas(mut self, names: &[&str]) -> Self {
        self.formulas.extend(set(names));
        self
    }

    pub fn with_unlinked(mut self, names: &[&str]) -> Self {
        self.formulas.extend(set(names));
        self.unlinked.extend(set(names));
        self
    }

    pub fn with_broken_link(mut self, names: &[&str]) -> Self {
        self.link_fails.extend(set(names));
        self
    }

    pub fn with_casks(mut self, names: &[&str]) -> Self {
        self.casks.extend(set(names));
        self
    }

    pub fn with_failing_install(mut self, name: &str, error: &str) -> Self {
        self.install_fails.push((name.to_string(), error.to_string()));
        self
    }

    /// Answer one rendered command line.
    pub fn reply(&self, line: &str) -> Result<String, String> {
        let args: Vec<&str> = line.split_whitespace().collect();
        match args.as_slice() {
            ["brew", "--version"] => Ok("Homebrew 4.4.0".to_string()),
            ["brew", "--prefix"] => Ok("/opt/homebrew".to_string()),
            ["brew", "tap"] => Ok(self.taps.iter().cloned().collect::<Vec<_>>().join("\n")),
            ["brew", "list", "--formula", "-1"] => Ok(join(&self.formulas)),
            ["brew", "list", "--cask", "-1"] => Ok(join(&self.casks)),
            ["brew", "list", "--formula", name] => present(&self.formulas, name),
            ["brew", "list", "--cask", name] => present(&self.casks, name),
            ["brew", "info", "--json=v2", "--formula", name] => Ok(format!(
                r#"{{"formulae":[{{"name":"{name}","keg_only":false,"linked_keg":{}}}]}}"#,
                if self.unlinked.contains(*name) {
                    "null"
                } else {
                    "\"1.0\""
                }
            )),
            ["brew", "link", "--overwrite", name] => {
                if self.link_fails.contains(*name) {
                    Err(format!("Error: Could not symlink bin/{name}"))
                } else {
                    Ok(String::new())
                }
            }
            ["brew", "install", name] | ["brew", "install", "--cask", name] => self
                .install_fails
                .iter()
                .find(|(n, _)| n.as_str() == *name)
                .map_or_else(|| Ok(String::new()), |(_, e)| Err(e.clone())),
            ["brew", ..] => Ok(String::new()),
            ["mise", "--version"] => Err("mise: command not found".to_string()),
            _ => Ok(String::new()),
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join("\n")
}

fn present(names: &BTreeSet<String>, name: &str) -> Result<String, String> {
    if names.contains(name) {
        Ok(String::new())
    } else {
        Err(format!("Error: No such keg: {name}"))
    }
}

/// Executor backed by a [`Machine`].
///
/// Every `brew` call sleeps for `delay` while counted as in flight, so tests
/// can observe whether the gate ever let two through at once.
#[derive(Debug)]
pub struct FakeExecutor {
    machine: Machine,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    /// Fire this token once this many installs have started.
    cancel_after: Mutex<Option<(usize, CancelToken)>>,
}

impl FakeExecutor {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            cancel_after: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn cancel_after_installs(&self, installs: usize, token: CancelToken) {
        *self.cancel_after.lock().unwrap() = Some((installs, token));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Most `brew` invocations observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Executor for FakeExecutor {
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecResult, ExecError> {
        cancel.check()?;
        let command = spec.to_string();
        self.calls.lock().unwrap().push(command.clone());

        if command.starts_with("brew install") {
            let mut guard = self.cancel_after.lock().unwrap();
            if let Some((remaining, token)) = guard.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    token.cancel();
                }
            }
        }

        let is_brew = spec.program == "brew";
        if is_brew {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        match self.machine.reply(&command) {
            Ok(stdout) => Ok(ExecResult {
                stdout,
                stderr: String::new(),
                code: Some(0),
            }),
            Err(output) => Err(ExecError::Failed {
                command,
                code: 1,
                output,
            }),
        }
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        matches!(program, "brew" | "git").then(|| PathBuf::from(program))
    }
}

/// Settings rooted in `home` with no application directories.
pub fn settings(home: &Path, workers: usize) -> Settings {
    Settings::new(home.to_path_buf())
        .with_app_dirs(vec![home.join("Applications")])
        .with_workers(workers)
}

/// An orchestrator over `executor` with verification disabled.
pub fn orchestrator(
    home: &Path,
    workers: usize,
    executor: &Arc<FakeExecutor>,
) -> (Orchestrator, Receiver<ProgressUpdate>) {
    let (orch, rx) = Orchestrator::new(
        settings(home, workers),
        Arc::clone(executor) as Arc<dyn Executor>,
        Arc::new(NullLog),
        CancelToken::new(),
    );
    (orch.with_verifier(Verifier::new(Vec::new(), Vec::new())), rx)
}

/// A catalog with the two system prerequisites, three required formulas,
/// two optional formulas, and one optional cask.
pub fn small_catalog() -> Catalog {
    Catalog::from_packages(vec![
        Package::new("Xcode CLI Tools", Mechanism::System, "core").required(),
        Package::new("Homebrew", Mechanism::System, "core").required(),
        Package::new("wget", Mechanism::Formula, "core").required(),
        Package::new("git", Mechanism::Formula, "core").required(),
        Package::new("curl", Mechanism::Formula, "core").required(),
        Package::new("htop", Mechanism::Formula, "shell_cli"),
        Package::new("jq", Mechanism::Formula, "shell_cli"),
        Package::new("zoom", Mechanism::Cask, "communication"),
    ])
    .expect("valid catalog")
}

/// `count` formulas named `f00`, `f01`, ...
pub fn formulas(count: usize) -> Vec<Package> {
    (0..count)
        .map(|i| Package::new(format!("f{i:02}"), Mechanism::Formula, "shell_cli"))
        .collect()
}
