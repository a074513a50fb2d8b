//! Report display - what changed, or would change in dry-run

use colored::Colorize;
use declarative::{Action, ExecuteSummary, Report};
use serde_json::Value;

/// Symbol and color for one report
fn symbol(report: &Report) -> colored::ColoredString {
    match report.action {
        Action::Create | Action::Grant | Action::AddMembers => "+".green(),
        Action::Delete | Action::Revoke | Action::RemoveMembers => "-".red(),
        Action::Update => "~".yellow(),
        Action::Query => "?".cyan(),
        Action::NoChange => "○".dimmed(),
    }
}

/// One line per report, with the changed attributes or targets underneath
pub fn display_report(report: &Report) {
    let name = format!("{} {}", report.resource_type, report.id);
    let detail = if report.diff.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = report.diff.iter().map(String::as_str).collect();
        format!("({})", names.join(", "))
    };
    println!("  {} {:<40} {}", symbol(report), name, detail.dimmed());

    if let Some(targets) = &report.targets {
        display_targets(targets, 2);
    }
    if let Some(current) = &report.current {
        display_targets(current, 2);
    }
}

/// Nested object as indented lines
fn display_targets(value: &Value, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(inner) if inner.is_empty() => {}
                    Value::Object(_) => {
                        println!("{}{}", indent, key.bold());
                        display_targets(value, depth + 1);
                    }
                    Value::Array(items) if items.is_empty() => {}
                    other => println!("{}{}: {}", indent, key.dimmed(), inline(other)),
                }
            }
        }
        other => println!("{}{}", indent, inline(other)),
    }
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(inline).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Summary footer
pub fn display_summary(summary: &ExecuteSummary) {
    println!();
    if summary.total_changes() == 0 {
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let verb = if summary.dry_run { "Would apply" } else { "Applied" };
    println!(
        "  {} {} {} changes: {} created, {} updated, {} deleted, {} granted, {} revoked, {} membership",
        if summary.dry_run { "ℹ".blue() } else { "✓".green() },
        verb,
        summary.total_changes().to_string().bold(),
        summary.created.to_string().green(),
        summary.updated.to_string().yellow(),
        summary.deleted.to_string().red(),
        summary.granted.to_string().green(),
        summary.revoked.to_string().red(),
        summary.members_changed
    );
    if summary.no_change > 0 {
        println!("    {} unchanged", summary.no_change.to_string().dimmed());
    }
    if summary.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    }
}
