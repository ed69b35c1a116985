//! Command: provision the machine.
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cancel::{self, CancelToken};
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::progress::{ProgressUpdate, format_progress};
use crate::tasks::ledger::InstallStatus;
use crate::tasks::orchestrator::Orchestrator;
use crate::tasks::plan::{ExecutionPlan, build_plan};

/// How progress updates reach the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporter {
    /// One line per update, nothing redrawn.
    Headless,
    /// A live progress line listing running steps, with a result line as
    /// each one finishes.
    Live,
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if setup fails, any step fails, or the run is
/// interrupted.
pub fn run(global: &GlobalOpts, verbose: bool, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("macsetup {}", super::version::version()));

    let mut setup = CommandSetup::init(global, verbose, log)?;
    let cancel = CancelToken::new();
    cancel::install_interrupt_handler(&cancel)?;
    let (orchestrator, rx) = setup.orchestrator(log, cancel.clone());

    if global.skip_installed {
        log.stage("Scanning installed packages");
        setup.deselect_installed(orchestrator.context(), log)?;
    }

    let plan = build_plan(&setup.catalog, &setup.selection);
    log.info(&format!(
        "plan: {} taps, {} formulas, {} casks",
        plan.taps.len(),
        plan.formulas.len(),
        plan.casks.len()
    ));

    if global.dry_run {
        super::dry_run::run(orchestrator.context(), &plan, log);
        return Ok(());
    }

    let reporter = if global.headless {
        Reporter::Headless
    } else {
        Reporter::Live
    };

    log.stage("Installing");
    drive(orchestrator, rx, plan, log, reporter, verbose)
}

/// Run `plan` on a worker thread while this thread reports progress, then
/// print the summary.
///
/// # Errors
///
/// Returns an error naming the number of failed steps, or
/// [`Interrupted`](crate::error::Interrupted) if the run was cancelled.
pub fn drive(
    orchestrator: Orchestrator,
    rx: Receiver<ProgressUpdate>,
    plan: ExecutionPlan,
    log: &Logger,
    reporter: Reporter,
    verbose: bool,
) -> Result<()> {
    let handle = std::thread::Builder::new()
        .name("orchestrator".to_string())
        .spawn(move || orchestrator.run_plan(&plan))
        .context("spawning orchestrator thread")?;

    report(&rx, log, reporter, verbose);

    let outcome = handle
        .join()
        .map_err(|_| anyhow::anyhow!("orchestrator thread panicked"))?;
    log.finish_progress();

    match outcome {
        Ok(summary) => {
            log.print_summary(&summary);
            let failed = summary.failed_count();
            if failed > 0 {
                anyhow::bail!("{failed} steps failed");
            }
            Ok(())
        }
        Err(interrupted) => {
            log.print_summary(&interrupted.partial);
            Err(interrupted.into())
        }
    }
}

/// Consume updates until the orchestrator closes the channel.
fn report(rx: &Receiver<ProgressUpdate>, log: &Logger, reporter: Reporter, verbose: bool) {
    for update in rx {
        let line = format_progress(&update, verbose);
        match reporter {
            Reporter::Headless => log.plain(&line),
            Reporter::Live if update.status.is_terminal() => {
                log.notify_task_done(&update.package.name, &line);
            }
            Reporter::Live if update.status == InstallStatus::Running => {
                log.notify_task_start(&update.package.name);
            }
            Reporter::Live => {}
        }
    }
}
