//! Terminal rendering of run progress and results.

use colored::Colorize;
use fq_protocol::events::RunEvent;
use fq_protocol::result_models::{Bucket, FlowExecutionResult, StepOutcome};
use tokio::sync::mpsc::Receiver;

/// Print events until the channel closes.
pub async fn print_events(mut events_rx: Receiver<RunEvent>) {
    while let Some(event) = events_rx.recv().await {
        print_event(&event);
    }
}

fn print_event(event: &RunEvent) {
    match event {
        RunEvent::FlowStarted {
            flow_name,
            environment,
            total_steps,
            ..
        } => {
            println!(
                "{} {} ({environment}, {total_steps} steps)",
                "Running".bold(),
                flow_name.cyan()
            );
        }
        RunEvent::StepStarted {
            index,
            name,
            action,
            ..
        } => {
            println!("{}", format!("  [{}] {name} ({action})", index + 1).dimmed());
        }
        RunEvent::OutcomeRecorded {
            bucket, outcome, ..
        } => print_outcome(*bucket, outcome),
        RunEvent::FlowCompleted { .. } => {}
    }
}

fn print_outcome(bucket: Bucket, outcome: &StepOutcome) {
    match bucket {
        Bucket::Passed => {
            let status = outcome
                .status
                .as_deref()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            println!(
                "    {} {}{} {}",
                "✓".green(),
                outcome.step,
                status,
                format!("{:.2}s", outcome.duration).dimmed()
            );
            if !outcome.issues.is_empty() {
                println!("      {} issue(s) found", outcome.issues.len());
            }
        }
        Bucket::Failed => {
            println!("    {} {}", "✗".red(), outcome.step.red());
            if let Some(error) = &outcome.error {
                println!("      {error}");
            }
            if let Some(screenshot) = &outcome.screenshot {
                println!("      screenshot: {screenshot}");
            }
        }
        Bucket::Skipped => {
            let reason = outcome.reason.as_deref().unwrap_or("skipped");
            println!("    {} {} ({reason})", "○".yellow(), outcome.step.yellow());
        }
    }
}

/// Print the coverage summary of a finished run.
pub fn print_summary(result: &FlowExecutionResult) {
    let Some(summary) = &result.coverage_summary else {
        return;
    };

    println!();
    println!(
        "{} {} passed, {} failed, {} skipped ({} steps)",
        "Summary:".bold(),
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        summary.skipped.to_string().yellow(),
        summary.total
    );
    for step in &summary.failed_steps {
        println!("  {} {step}", "failed:".red());
    }
    for step in &summary.skipped_steps {
        println!("  {} {step}", "skipped:".yellow());
    }
    if !result.js_errors.is_empty() {
        println!("{} {}", "JavaScript errors:".bold(), result.js_errors.len());
        for error in &result.js_errors {
            println!("  {} {}", error.url.dimmed(), error.message);
        }
    }
}
