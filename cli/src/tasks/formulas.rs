//! Formula installs on a bounded worker pool.
//!
//! Each worker holds the brew gate only for its own `brew` invocations, so
//! status checks for one formula interleave with installs of another.
use std::sync::{Mutex, PoisonError};

use anyhow::{Context as _, Result};
use rayon::prelude::*;

use super::ledger::InstallResult;
use super::{Context, Outcome, Step, execute};
use crate::config::Package;
use crate::error::is_cancellation;

/// Install one formula, repairing its links when already present.
#[derive(Debug, Clone)]
pub struct FormulaStep {
    /// Formula catalog entry.
    pub package: Package,
}

impl Step for FormulaStep {
    fn package(&self) -> Package {
        self.package.clone()
    }

    fn run(&self, ctx: &Context) -> Result<Outcome> {
        let name = self.package.name.as_str();
        if !ctx.brew.is_installed(&self.package)? {
            ctx.brew.install(&self.package)?;
            return Ok(Outcome::installed());
        }

        let linked = match ctx.brew.is_linked(name) {
            Ok(linked) => linked,
            Err(e) if is_cancellation(&e) => return Err(e),
            Err(e) => {
                ctx.log.debug(&format!("{name}: link state unknown: {e:#}"));
                false
            }
        };
        if linked {
            return Ok(Outcome::skipped("already installed"));
        }

        match ctx.brew.link(name) {
            Ok(()) => Ok(Outcome::skipped("already installed (relinked)")),
            Err(e) if e.is_cancelled() => Err(e.into()),
            Err(e) => Ok(Outcome::failed(
                "installed but not linked (link repair failed)",
                format!("installed but not linked: {e}"),
            )),
        }
    }
}

/// Install `formulas` on `ctx.settings.workers` threads.
///
/// A formula whose job has not started when the run is cancelled is never
/// started and gets no ledger entry. Results are sorted by name.
///
/// # Errors
///
/// Returns an error if the worker pool cannot be created.
pub fn install_formulas(ctx: &Context, formulas: &[Package]) -> Result<Vec<InstallResult>> {
    if formulas.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.settings.workers.max(1))
        .thread_name(|i| format!("formula-{i}"))
        .build()
        .context("building formula worker pool")?;

    let results = Mutex::new(Vec::with_capacity(formulas.len()));
    pool.install(|| {
        formulas.par_iter().with_max_len(1).for_each(|pkg| {
            if ctx.cancel.is_cancelled() {
                return;
            }
            let step = FormulaStep {
                package: pkg.clone(),
            };
            let result = execute(&step, ctx);
            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(result);
        });
    });

    let mut results = results
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    results.sort_by(|a, b| a.package.name.cmp(&b.package.name));
    Ok(results)
}
