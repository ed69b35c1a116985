//! Run settings and the per-run context shared by every step.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::cancel::CancelToken;
use crate::exec::Executor;
use crate::gate::BrewGate;
use crate::logging::Log;
use crate::progress::ProgressSender;
use crate::resources::apps::default_app_dirs;
use crate::resources::brew::Brew;

/// Formula installs run on this many workers unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 5;

/// User-facing knobs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Home directory all postinstall targets live under.
    pub home: PathBuf,
    /// Directories probed for manually installed application bundles.
    pub app_dirs: Vec<PathBuf>,
    /// Formula worker count (always at least 1).
    pub workers: usize,
    /// Log command lines and step durations.
    pub verbose: bool,
}

impl Settings {
    /// Defaults rooted at `home`.
    #[must_use]
    pub fn new(home: PathBuf) -> Self {
        Self {
            app_dirs: default_app_dirs(&home),
            home,
            workers: DEFAULT_WORKERS,
            verbose: false,
        }
    }

    /// Defaults rooted at `$HOME`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME environment variable is not set.
    pub fn from_env() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?;
        Ok(Self::new(PathBuf::from(home)))
    }

    /// Set the worker count; `0` selects [`DEFAULT_WORKERS`].
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 {
            DEFAULT_WORKERS
        } else {
            workers
        };
        self
    }

    /// Replace the bundle search directories.
    #[must_use]
    pub fn with_app_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.app_dirs = dirs;
        self
    }

    /// Enable verbose logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Services and settings shared by every step of a run.
///
/// The gate and cancel token are owned by the run and handed out by
/// reference; nothing here is process-global.
#[derive(Clone)]
pub struct Context {
    /// Paths and concurrency for the run.
    pub settings: Settings,
    /// Command executor (real or scripted).
    pub executor: Arc<dyn Executor>,
    /// Serializes package-manager calls.
    pub gate: Arc<BrewGate>,
    /// Homebrew client sharing `executor`, `gate`, and `cancel`.
    pub brew: Brew,
    /// The run's cancellation signal.
    pub cancel: CancelToken,
    /// Logger for output.
    pub log: Arc<dyn Log>,
    /// Progress channel producer.
    pub progress: ProgressSender,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("executor", &"<dyn Executor>")
            .field("gate", &self.gate)
            .field("cancel", &self.cancel)
            .field("log", &"<dyn Log>")
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context with a fresh gate.
    #[must_use]
    pub fn new(
        settings: Settings,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
        progress: ProgressSender,
        cancel: CancelToken,
    ) -> Self {
        let gate = Arc::new(BrewGate::new());
        let brew = Brew::new(Arc::clone(&executor), Arc::clone(&gate), cancel.clone());
        Self {
            settings,
            executor,
            gate,
            brew,
            cancel,
            log,
            progress,
        }
    }

    /// The user's home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.settings.home
    }

    /// `~/.config`.
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.settings.home.join(".config")
    }
}
