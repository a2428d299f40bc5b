//! Result accumulation for a single run.
//!
//! The accumulator owns the three outcome buckets for the lifetime of a
//! run. Outcomes are normalized on the way in, appended in order and never
//! removed; [`ResultAccumulator::finish`] computes the coverage summary
//! once and hands the result back read-only.

use fq_protocol::events::RunEvent;
use fq_protocol::result_models::{
    Bucket, CoverageSummary, FlowExecutionResult, JsError, StepOutcome, MISSING_ERROR,
    MISSING_STEP_NAME,
};
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

pub struct ResultAccumulator {
    result: FlowExecutionResult,
    events_tx: Option<Sender<RunEvent>>,
}

impl ResultAccumulator {
    pub fn new(
        flow_name: impl Into<String>,
        environment: impl Into<String>,
        events_tx: Option<Sender<RunEvent>>,
    ) -> Self {
        Self {
            result: FlowExecutionResult::new(flow_name, environment),
            events_tx,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.result.run_id
    }

    /// Outcomes recorded so far in `bucket`.
    pub fn bucket(&self, bucket: Bucket) -> &[StepOutcome] {
        self.result.bucket(bucket)
    }

    /// Append an outcome and emit `OutcomeRecorded`.
    ///
    /// An empty step name becomes [`MISSING_STEP_NAME`]; a failure with no
    /// error text gets [`MISSING_ERROR`]. Either repair is logged.
    pub async fn record(&mut self, bucket: Bucket, mut outcome: StepOutcome) {
        if outcome.step.trim().is_empty() {
            tracing::warn!(%bucket, "Outcome recorded without a step name");
            outcome.step = MISSING_STEP_NAME.to_string();
        }
        if bucket == Bucket::Failed && outcome.error.as_deref().map_or(true, |e| e.trim().is_empty()) {
            tracing::warn!(step = %outcome.step, "Failure recorded without an error message");
            outcome.error = Some(MISSING_ERROR.to_string());
        }

        tracing::debug!(step = %outcome.step, %bucket, "Recording outcome");
        self.emit(RunEvent::OutcomeRecorded {
            run_id: self.result.run_id,
            bucket,
            outcome: outcome.clone(),
        })
        .await;

        match bucket {
            Bucket::Passed => self.result.passed.push(outcome),
            Bucket::Failed => self.result.failed.push(outcome),
            Bucket::Skipped => self.result.skipped.push(outcome),
        }
    }

    pub fn record_js_errors(&mut self, errors: Vec<JsError>) {
        self.result.js_errors.extend(errors);
    }

    /// Emit an event on the run's channel, if any. A closed channel is
    /// ignored; a full one waits for the receiver.
    pub async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Compute the coverage summary over `total` authored steps, emit
    /// `FlowCompleted` and return the finished result.
    pub async fn finish(mut self, total: usize) -> FlowExecutionResult {
        let summary = CoverageSummary::from_buckets(
            total,
            &self.result.passed,
            &self.result.failed,
            &self.result.skipped,
        );
        self.emit(RunEvent::FlowCompleted {
            run_id: self.result.run_id,
            summary: summary.clone(),
        })
        .await;
        self.result.coverage_summary = Some(summary);
        self.result
    }
}
