//! Progress events emitted while a flow runs.
//!
//! The engine sends these over an optional channel so a front end can
//! render progress without reaching into the result accumulator.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "outcomeRecorded",
//!   "payload": { "run_id": "...", "bucket": "failed", "outcome": { "step": "Open cart" } }
//! }
//! ```

use crate::result_models::{Bucket, CoverageSummary, StepOutcome};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RunEvent {
    /// A run has begun.
    FlowStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        flow_name: String,
        environment: String,
        total_steps: usize,
    },

    /// A top-level step is about to be processed.
    StepStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        index: usize,
        name: String,
        action: String,
    },

    /// An outcome has been appended to a bucket.
    OutcomeRecorded {
        #[ts(type = "string")]
        run_id: Uuid,
        bucket: Bucket,
        outcome: StepOutcome,
    },

    /// The run is over and the summary has been computed.
    FlowCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        summary: CoverageSummary,
    },
}
