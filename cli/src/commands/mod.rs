//! Subcommand handlers and the setup they share.
pub mod completions;
pub mod dry_run;
pub mod install;
pub mod list;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::cancel::CancelToken;
use crate::cli::GlobalOpts;
use crate::config::{Catalog, Selection, validation};
use crate::error::Interrupted;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::progress::{self, ProgressUpdate};
use crate::tasks::orchestrator::Orchestrator;
use crate::tasks::scan::scan_installed;
use crate::tasks::ledger::Summary;
use crate::tasks::{Context, Settings};

/// Shared state produced by the common command setup sequence.
///
/// Loads the catalog, resolves the selection, and derives run settings so
/// that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Validated package catalog.
    pub catalog: Catalog,
    /// Names chosen for this run, overrides applied.
    pub selection: Selection,
    /// Paths and concurrency for the run.
    pub settings: Settings,
}

impl CommandSetup {
    /// Load the catalog and apply the selection flags.
    ///
    /// # Errors
    ///
    /// Returns an error if `$HOME` is unset, the catalog fails to load, or a
    /// `--with`/`--without` name is unknown or required.
    pub fn init(global: &GlobalOpts, verbose: bool, log: &Logger) -> Result<Self> {
        let settings = Settings::from_env()?
            .with_workers(global.workers)
            .with_verbose(verbose);
        Self::init_with(global, settings, log)
    }

    /// Like [`init`](Self::init) with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails to load or a selection override
    /// is invalid.
    pub fn init_with(global: &GlobalOpts, settings: Settings, log: &Logger) -> Result<Self> {
        log.stage("Loading catalog");
        let catalog = match &global.catalog {
            Some(path) => {
                log.debug(&format!("catalog: {}", path.display()));
                Catalog::load(path)?
            }
            None => Catalog::embedded()?,
        };
        log.info(&format!(
            "loaded {} packages in {} categories",
            catalog.packages.len(),
            catalog.categories.len()
        ));

        let warnings = validation::validate(&catalog);
        if !warnings.is_empty() {
            log.warn(&format!("found {} catalog warning(s):", warnings.len()));
            for warning in &warnings {
                log.warn(&format!("  {}: {}", warning.item, warning.message));
            }
        }

        let mut selection = Selection::defaults(&catalog);
        selection.apply_overrides(&catalog, &global.with, &global.without)?;
        log.debug(&format!("{} packages selected", selection.len()));

        Ok(Self {
            catalog,
            selection,
            settings,
        })
    }

    /// Build a run context over the real system and the orchestrator that
    /// owns it.
    #[must_use]
    pub fn orchestrator(
        &self,
        log: &Arc<Logger>,
        cancel: CancelToken,
    ) -> (Orchestrator, std::sync::mpsc::Receiver<ProgressUpdate>) {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let log: Arc<dyn Log> = Arc::clone(log) as Arc<dyn Log>;
        Orchestrator::new(self.settings.clone(), executor, log, cancel)
    }

    /// A standalone context for read-only probing.
    #[must_use]
    pub fn probe_context(&self, log: &Arc<Logger>) -> Context {
        let (tx, _rx) = progress::channel();
        let log: Arc<dyn Log> = Arc::clone(log) as Arc<dyn Log>;
        Context::new(
            self.settings.clone(),
            Arc::new(SystemExecutor),
            log,
            tx,
            CancelToken::new(),
        )
    }

    /// Drop optional packages the machine already has from the selection.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] with an empty ledger, leaving the selection
    /// untouched, if the run was cancelled during the scan.
    pub fn deselect_installed(&mut self, ctx: &Context, log: &Logger) -> Result<(), Interrupted> {
        let installed = scan_installed(ctx, &self.catalog);
        if ctx.cancel.is_cancelled() {
            return Err(Interrupted {
                partial: Summary::default(),
            });
        }
        let removed = self.selection.deselect_installed(&self.catalog, &installed);
        if removed.is_empty() {
            log.debug("no installed packages to deselect");
        } else {
            log.info(&format!(
                "skipping {} already installed package(s): {}",
                removed.len(),
                removed.join(", ")
            ));
        }
        Ok(())
    }
}
