//! CLI output formatting

use crate::blueprint::Blueprint;
use crate::execution::{RunOutcome, RunReport};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a run outcome for display
pub fn format_outcome(outcome: RunOutcome) -> String {
    match outcome {
        RunOutcome::Succeeded => style("SUCCEEDED").green().to_string(),
        RunOutcome::Failed => style("FAILED").red().to_string(),
        RunOutcome::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// One-line summary of a finished run
pub fn format_run_report(report: &RunReport) -> String {
    let icon = match report.outcome {
        RunOutcome::Succeeded => CHECK,
        RunOutcome::Failed => CROSS,
        RunOutcome::Cancelled => WARN,
    };

    let duration = report
        .finished_at
        .signed_duration_since(report.started_at)
        .num_milliseconds();

    format!(
        "{} run {} {} - {} executed, {} skipped ({}ms)",
        icon,
        style(&report.run_id.to_string()[..8]).dim(),
        format_outcome(report.outcome),
        report.executed_steps.len(),
        report.skipped_steps.len(),
        duration
    )
}

/// Multi-line summary of a parsed blueprint
pub fn format_blueprint_summary(blueprint: &Blueprint) -> String {
    let mut out = format!(
        "  Platform: {}\n  Jobs: {}\n",
        style(&blueprint.platform).bold(),
        style(blueprint.jobs.len()).cyan()
    );

    for job in &blueprint.jobs {
        out.push_str(&format!(
            "    {} ({} step{})\n",
            style(&job.display_name).bold(),
            job.steps.len(),
            if job.steps.len() == 1 { "" } else { "s" }
        ));
        for step in &job.steps {
            let condition = match &step.run_condition {
                Some(c) => format!(" [if {}]", style(c).dim()),
                None => String::new(),
            };
            out.push_str(&format!(
                "      {} {}{}\n",
                style(&step.id).cyan(),
                step.display_name,
                condition
            ));
        }
    }
    out
}
