//! Execution engine - reconciles planned resources one after another

use crate::context::{ApplyContext, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::types::{ExecuteSummary, Report};
use anyhow::{Context, Result};

/// Execute a plan sequentially
///
/// Resources run in plan order, one remote call in flight at a time. The
/// first failure aborts the run; resources already converged stay converged.
///
/// # Returns
/// Every report, in plan order, and their summary
pub fn execute<P: ProgressCallback>(
    plan: &ExecutionPlan,
    ctx: &ApplyContext,
    progress: &mut P,
) -> Result<(Vec<Report>, ExecuteSummary)> {
    let mut reports = Vec::with_capacity(plan.len());
    let mut summary = ExecuteSummary {
        dry_run: ctx.dry_run(),
        ..Default::default()
    };

    for resource in plan.resources() {
        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());

        let report = resource
            .converge(ctx)
            .with_context(|| format!("{} {}", resource.resource_type(), id))?;

        progress.on_resource_complete(&report);
        summary.add_report(&report);
        reports.push(report);
    }

    Ok((reports, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use crate::NoProgress;
    use crate::types::{Action, Mode};

    #[derive(Debug)]
    struct TestResource {
        id: String,
        should_change: bool,
        fail: bool,
    }

    impl TestResource {
        fn new(id: &str, should_change: bool) -> Self {
            Self {
                id: id.into(),
                should_change,
                fail: false,
            }
        }
    }

    impl Resource for TestResource {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Test resource {}", self.id)
        }

        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn converge(&self, ctx: &ApplyContext) -> Result<Report> {
            if self.fail {
                anyhow::bail!("boom");
            }
            if !self.should_change {
                return Ok(Report::unchanged("test", &self.id, ctx.mode));
            }
            Ok(Report::changed("test", &self.id, Action::Create, ctx.mode))
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let plan = ExecutionPlan::new();
        let ctx = ApplyContext::default();
        let (reports, summary) = execute(&plan, &ctx, &mut NoProgress).unwrap();
        assert!(reports.is_empty());
        assert_eq!(summary.total_changes(), 0);
    }

    #[test]
    fn test_execute_no_changes() {
        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(TestResource::new("test1", false)));

        let (reports, summary) =
            execute(&plan, &ApplyContext::default(), &mut NoProgress).unwrap();
        assert!(!reports[0].changed);
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(summary.no_change, 1);
    }

    #[test]
    fn test_execute_with_changes() {
        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(TestResource::new("test1", true)));

        let (_, summary) =
            execute(&plan, &ApplyContext::default(), &mut NoProgress).unwrap();
        assert_eq!(summary.created, 1);
    }

    #[test]
    fn test_execute_dry_run_reports_same_change() {
        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(TestResource::new("test1", true)));

        let ctx = ApplyContext::new(Mode::DryRun);
        let (reports, summary) = execute(&plan, &ctx, &mut NoProgress).unwrap();
        assert!(reports[0].changed);
        assert!(reports[0].dry_run);
        assert!(summary.dry_run);
    }

    #[test]
    fn test_execute_aborts_on_first_error() {
        let mut plan = ExecutionPlan::new();
        let mut failing = TestResource::new("bad", true);
        failing.fail = true;
        plan.push(Box::new(failing));
        plan.push(Box::new(TestResource::new("after", true)));

        let err = execute(&plan, &ApplyContext::default(), &mut NoProgress).unwrap_err();
        assert!(format!("{err:#}").contains("test bad"));
    }

    #[test]
    fn test_progress_sees_every_resource() {
        struct Count(usize, usize);
        impl ProgressCallback for Count {
            fn on_resource_start(&mut self, _id: &str, _description: &str) {
                self.0 += 1;
            }
            fn on_resource_complete(&mut self, _report: &Report) {
                self.1 += 1;
            }
        }

        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(TestResource::new("a", true)));
        plan.push(Box::new(TestResource::new("b", false)));

        let mut count = Count(0, 0);
        execute(&plan, &ApplyContext::default(), &mut count).unwrap();
        assert_eq!((count.0, count.1), (2, 2));
    }
}
