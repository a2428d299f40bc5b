//! Custom assertion helpers for run results and events.

use fq_protocol::events::RunEvent;
use fq_protocol::result_models::{FlowExecutionResult, StepOutcome};

/// Step names of a bucket, in order.
#[allow(dead_code)]
pub fn step_names(outcomes: &[StepOutcome]) -> Vec<&str> {
    outcomes.iter().map(|o| o.step.as_str()).collect()
}

/// Assert that the buckets together hold exactly `total` outcomes and that
/// the coverage summary agrees with them.
#[allow(dead_code)]
pub fn assert_partition(result: &FlowExecutionResult, total: usize) {
    let summary = result
        .coverage_summary
        .as_ref()
        .expect("Finished result should carry a coverage summary");

    assert_eq!(summary.total, total, "summary total");
    assert_eq!(summary.passed, result.passed.len());
    assert_eq!(summary.failed, result.failed.len());
    assert_eq!(summary.skipped, result.skipped.len());
    assert_eq!(
        result.passed.len() + result.failed.len() + result.skipped.len(),
        total,
        "every authored step should land in exactly one bucket"
    );
}

/// Find the outcome for `step` in a bucket.
#[allow(dead_code)]
pub fn find_outcome<'a>(outcomes: &'a [StepOutcome], step: &str) -> &'a StepOutcome {
    outcomes
        .iter()
        .find(|o| o.step == step)
        .unwrap_or_else(|| panic!("No outcome named '{step}' in {:?}", step_names(outcomes)))
}

/// Assert the event stream starts with `FlowStarted` and ends with
/// `FlowCompleted`.
#[allow(dead_code)]
pub fn assert_event_sequence(events: &[RunEvent]) {
    assert!(!events.is_empty(), "Event sequence is empty");
    assert!(
        matches!(events[0], RunEvent::FlowStarted { .. }),
        "First event should be FlowStarted, got: {:?}",
        events[0]
    );
    let last = events.last().expect("non-empty");
    assert!(
        matches!(last, RunEvent::FlowCompleted { .. }),
        "Last event should be FlowCompleted, got: {last:?}"
    );
}

#[allow(dead_code)]
pub fn count_recorded(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RunEvent::OutcomeRecorded { .. }))
        .count()
}
