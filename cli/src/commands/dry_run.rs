//! Command: print the plan without changing anything.
use crate::logging::Logger;
use crate::tasks::Context;
use crate::tasks::dry_run::dry_run_lines;
use crate::tasks::plan::ExecutionPlan;

/// Log the planned steps for `plan` as probed through `ctx`.
pub fn run(ctx: &Context, plan: &ExecutionPlan, log: &Logger) {
    log.stage("Dry run: planned steps");
    for line in dry_run_lines(ctx, plan) {
        log.dry_run(&format!("- {line}"));
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Mechanism, Package};
    use crate::logging::isolated_logger;
    use crate::tasks::test_helpers::make_context;
    use crate::testing::ScriptedExecutor;

    #[test]
    fn writes_every_line_to_the_log() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let (ctx, exec, _rx) = make_context(dir.path(), ScriptedExecutor::new());
        let plan = ExecutionPlan {
            formulas: vec![Package::new("jq", Mechanism::Formula, "shell_cli")],
            ..ExecutionPlan::default()
        };
        run(&ctx, &plan, &log);

        let content = std::fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(content.contains("Dry run: planned steps"));
        assert!(content.contains("- Formulas (parallel): 1"));
        assert!(content.contains("-   - jq (formula): would install (brew not installed yet)"));
        assert!(exec.calls().iter().all(|c| !c.starts_with("brew install")));
    }
}
