//! Execution engine - runs a plan and prints its reports

use anyhow::Result;
use declarative::{ApplyContext, ExecuteSummary, ExecutionPlan, ProgressCallback, Report, execute};
use serde_json::json;

use super::differ::{display_report, display_summary};

/// How reports are shown
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print one JSON document on stdout instead of colored lines
    pub json: bool,
    /// Suppress human output
    pub quiet: bool,
}

/// Prints each report as soon as its resource converged
struct LineProgress {
    enabled: bool,
}

impl ProgressCallback for LineProgress {
    fn on_resource_start(&mut self, id: &str, description: &str) {
        log::debug!("{}: {}", id, description);
    }

    fn on_resource_complete(&mut self, report: &Report) {
        if self.enabled {
            display_report(report);
        }
    }
}

/// Converge every resource of `plan` in order
///
/// The first failure aborts the run and no summary is printed.
pub fn run(plan: &ExecutionPlan, ctx: &ApplyContext, output: Output) -> Result<ExecuteSummary> {
    if plan.is_empty() {
        log::warn!("Nothing to reconcile");
    }

    let mut progress = LineProgress {
        enabled: !output.json && !output.quiet,
    };
    let (reports, summary) = execute(plan, ctx, &mut progress)?;

    if output.json {
        let document = json!({"reports": reports, "summary": summary});
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else if !output.quiet {
        display_summary(&summary);
    }

    Ok(summary)
}
