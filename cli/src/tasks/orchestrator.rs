//! Sequences one provisioning run.
//!
//! Phases run strictly in order: core prerequisites, taps, formulas (worker
//! pool), casks, postinstall, verification. Cancellation is checked between
//! phases; a cancelled run returns [`Interrupted`] with whatever was
//! recorded. The progress channel closes when [`Orchestrator::run`]
//! returns.
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use super::casks::install_casks;
use super::formulas::install_formulas;
use super::ledger::Summary;
use super::plan::{ExecutionPlan, build_plan};
use super::postinstall::run_postinstall;
use super::prereqs::core_steps;
use super::taps::install_taps;
use super::verify::Verifier;
use super::{Context, Outcome, Settings, Step, execute, record};
use crate::cancel::CancelToken;
use crate::config::{Catalog, Selection};
use crate::error::Interrupted;
use crate::exec::Executor;
use crate::logging::Log;
use crate::progress::{self, ProgressUpdate};

/// Owns the services for one run and drives it to completion.
pub struct Orchestrator {
    ctx: Context,
    core: Vec<Box<dyn Step>>,
    verifier: Verifier,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("ctx", &self.ctx)
            .field("core_steps", &self.core.len())
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator and the receiving end of its progress channel.
    #[must_use]
    pub fn new(
        settings: Settings,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
        cancel: CancelToken,
    ) -> (Self, Receiver<ProgressUpdate>) {
        let (tx, rx) = progress::channel();
        let ctx = Context::new(settings, executor, log, tx, cancel);
        (
            Self {
                ctx,
                core: core_steps(),
                verifier: Verifier::default(),
            },
            rx,
        )
    }

    /// Replace the core prerequisite steps.
    #[must_use]
    pub fn with_core_steps(mut self, steps: Vec<Box<dyn Step>>) -> Self {
        self.core = steps;
        self
    }

    /// Replace the verification pass.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Shared run context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Plan `selection` against `catalog` and run it.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if the run is cancelled.
    pub fn run(self, catalog: &Catalog, selection: &Selection) -> Result<Summary, Interrupted> {
        let plan = build_plan(catalog, selection);
        self.run_plan(&plan)
    }

    /// Run an already-built plan.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if the run is cancelled.
    pub fn run_plan(self, plan: &ExecutionPlan) -> Result<Summary, Interrupted> {
        let Self {
            ctx,
            core,
            verifier,
        } = self;
        let mut summary = Summary::default();

        ctx.log.debug(&format!(
            "plan: {} taps, {} formulas, {} casks ({} workers)",
            plan.taps.len(),
            plan.formulas.len(),
            plan.casks.len(),
            ctx.settings.workers
        ));

        for step in &core {
            checkpoint(&ctx, &mut summary)?;
            summary.push(execute(step.as_ref(), &ctx));
        }

        checkpoint(&ctx, &mut summary)?;
        summary.extend(install_taps(&ctx, &plan.taps));

        checkpoint(&ctx, &mut summary)?;
        match install_formulas(&ctx, &plan.formulas) {
            Ok(results) => summary.extend(results),
            Err(e) => {
                ctx.log.error(&format!("{e:#}"));
                let reason = format!("{e:#}");
                for pkg in &plan.formulas {
                    summary.push(record(&ctx, pkg, || Ok(Outcome::failed("", reason.clone()))));
                }
            }
        }

        checkpoint(&ctx, &mut summary)?;
        summary.extend(install_casks(&ctx, &plan.casks));

        checkpoint(&ctx, &mut summary)?;
        summary.extend(run_postinstall(&ctx));

        checkpoint(&ctx, &mut summary)?;
        summary.extend(verifier.run(&ctx));

        checkpoint(&ctx, &mut summary)?;
        ctx.log.debug(&format!(
            "run finished: {} steps, {} failed",
            summary.results.len(),
            summary.failed_count()
        ));
        Ok(summary)
    }
}

/// Stop the run if cancellation has fired, handing back the partial ledger.
fn checkpoint(ctx: &Context, summary: &mut Summary) -> Result<(), Interrupted> {
    if ctx.cancel.is_cancelled() {
        ctx.log.debug("run cancelled");
        return Err(Interrupted {
            partial: std::mem::take(summary),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::{Mechanism, Package};
    use crate::logging::NullLog;
    use crate::tasks::ledger::InstallStatus;
    use crate::testing::ScriptedExecutor;

    struct Noop(&'static str);

    impl Step for Noop {
        fn package(&self) -> Package {
            Package::new(self.0, Mechanism::System, "core").required()
        }
        fn run(&self, _: &Context) -> anyhow::Result<Outcome> {
            Ok(Outcome::skipped("already installed"))
        }
    }

    struct CancelOnRun;

    impl Step for CancelOnRun {
        fn package(&self) -> Package {
            Package::task("cancel", "core")
        }
        fn run(&self, ctx: &Context) -> anyhow::Result<Outcome> {
            ctx.cancel.cancel();
            Ok(Outcome::installed())
        }
    }

    fn orchestrator(
        home: &std::path::Path,
        exec: ScriptedExecutor,
    ) -> (Orchestrator, Receiver<ProgressUpdate>) {
        let settings = Settings::new(home.to_path_buf()).with_app_dirs(Vec::new());
        Orchestrator::new(
            settings,
            Arc::new(exec.on_path("brew")),
            Arc::new(NullLog),
            CancelToken::new(),
        )
    }

    #[test]
    fn empty_plan_runs_core_postinstall_and_verification() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, rx) = orchestrator(dir.path(), ScriptedExecutor::new());
        let orch = orch
            .with_core_steps(vec![Box::new(Noop("Xcode CLI Tools"))])
            .with_verifier(Verifier::new(Vec::new(), Vec::new()));
        let summary = orch.run_plan(&ExecutionPlan::default()).unwrap();

        let names = summary.names();
        assert_eq!(names[0], "Xcode CLI Tools");
        assert_eq!(names[1], "Create config directories");
        assert_eq!(*names.last().unwrap(), "Post-install verification");
        assert_eq!(
            summary.get("Post-install verification").unwrap().status,
            InstallStatus::Installed
        );

        // The channel is closed once the run returns.
        let updates: Vec<ProgressUpdate> = rx.iter().collect();
        assert!(!updates.is_empty());
    }

    #[test]
    fn cancellation_returns_partial_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, _rx) = orchestrator(dir.path(), ScriptedExecutor::new());
        let orch =
            orch.with_core_steps(vec![Box::new(Noop("Xcode CLI Tools")), Box::new(CancelOnRun)]);
        let plan = ExecutionPlan {
            formulas: vec![Package::new("jq", Mechanism::Formula, "shell_cli")],
            ..ExecutionPlan::default()
        };
        let err = orch.run_plan(&plan).unwrap_err();
        assert_eq!(err.to_string(), "installation cancelled");
        assert_eq!(err.partial.names(), vec!["Xcode CLI Tools", "cancel"]);
    }

    #[test]
    fn precancelled_run_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, _rx) = orchestrator(dir.path(), ScriptedExecutor::new());
        orch.context().cancel.cancel();
        let err = orch.run_plan(&ExecutionPlan::default()).unwrap_err();
        assert!(err.partial.results.is_empty());
    }
}
