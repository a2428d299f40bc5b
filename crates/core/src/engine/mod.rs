//! Flow execution engine.
//!
//! The [`FlowEngine`] walks a flow's steps in order, dispatches each to its
//! action handler, applies blocking-skip propagation and records every
//! outcome in a [`ResultAccumulator`]. A run always produces a
//! [`FlowExecutionResult`]; only a flow that cannot be loaded is an error.

pub mod accumulator;
pub(crate) mod context;
pub mod diagnostics;
pub mod handlers;
pub(crate) mod retry;
pub mod scripts;
pub mod state;

pub use accumulator::ResultAccumulator;
pub use context::EngineSettings;
pub use state::RunState;

use crate::driver::base::BrowserDriver;
use crate::flows::{FlowError, FlowManager};
use context::{HandlerOutput, StepContext};
use fq_protocol::events::RunEvent;
use fq_protocol::flow_models::{ActionKind, Credentials, FlowDefinition, Importance, Step};
use fq_protocol::result_models::{Bucket, FlowExecutionResult, StepOutcome};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

/// Name given to a null step.
pub const UNKNOWN_STEP: &str = "Unknown step";
/// Name given to an unnamed step that is skipped.
pub const UNNAMED_STEP: &str = "Unnamed step";
pub const SKIPPED_AFTER_BLOCKING: &str = "Skipped due to blocking failure";
pub const ALREADY_LOGGED_IN: &str = "Skipped (already logged in)";
pub const LOGIN_STEP: &str = "Login";
pub const LOGIN_FAILED: &str = "Login failed";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// The main flow execution engine.
///
/// One engine owns one browser session; runs are sequential.
pub struct FlowEngine {
    driver: Arc<dyn BrowserDriver>,
    flows: FlowManager,
    settings: EngineSettings,
    events_tx: Option<Sender<RunEvent>>,
}

impl FlowEngine {
    pub fn new(driver: Arc<dyn BrowserDriver>, flows: FlowManager, settings: EngineSettings) -> Self {
        Self {
            driver,
            flows,
            settings,
            events_tx: None,
        }
    }

    /// Emit [`RunEvent`]s on `events_tx` while running.
    ///
    /// Sends wait for buffer space, so the receiver must keep reading until
    /// the channel closes or the run stalls once the buffer is full. A
    /// dropped receiver is fine; events are then discarded.
    pub fn with_events(mut self, events_tx: Sender<RunEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Load `flow_name` for `environment` and run it.
    ///
    /// # Errors
    ///
    /// Only when the flow cannot be loaded. Everything that happens during
    /// the run is recorded in the returned result.
    pub async fn execute_flow(
        &self,
        flow_name: &str,
        environment: &str,
        credentials: Option<&Credentials>,
    ) -> Result<FlowExecutionResult, EngineError> {
        let flow = self.flows.load_flow(flow_name, environment)?;
        Ok(self.run(&flow, environment, credentials).await)
    }

    /// Run an already loaded flow.
    ///
    /// With credentials, the engine logs in first; a failed login records a
    /// single `"Login"` failure and no step runs.
    pub async fn run(
        &self,
        flow: &FlowDefinition,
        environment: &str,
        credentials: Option<&Credentials>,
    ) -> FlowExecutionResult {
        let mut acc = ResultAccumulator::new(&flow.name, environment, self.events_tx.clone());
        let total = flow.steps.len();

        tracing::info!(flow = %flow.name, environment, steps = total, "Starting flow run");
        acc.emit(RunEvent::FlowStarted {
            run_id: acc.run_id(),
            flow_name: flow.name.clone(),
            environment: environment.to_string(),
            total_steps: total,
        })
        .await;

        if let Some(credentials) = credentials {
            if !self.authenticate(flow, credentials).await {
                tracing::error!(flow = %flow.name, "Login failed, aborting run");
                acc.record(
                    Bucket::Failed,
                    StepOutcome::new(LOGIN_STEP, Importance::Blocking).with_error(LOGIN_FAILED),
                )
                .await;
                return self.finish(acc, total).await;
            }
        }

        let mut state = RunState::default();
        for (index, step) in flow.steps.iter().enumerate() {
            state = self
                .run_step(flow, index, step.as_ref(), credentials, state, &mut acc)
                .await;
        }

        let result = self.finish(acc, total).await;
        tracing::info!(
            flow = %flow.name,
            passed = result.passed.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            "Flow run finished"
        );
        result
    }

    /// Attach the page's JavaScript errors and close the result.
    async fn finish(&self, mut acc: ResultAccumulator, total: usize) -> FlowExecutionResult {
        match self.driver.js_errors().await {
            Ok(errors) => {
                if !errors.is_empty() {
                    tracing::warn!(count = errors.len(), "JavaScript errors during run");
                }
                acc.record_js_errors(errors);
            }
            Err(err) => tracing::warn!(error = %err, "Could not collect JavaScript errors"),
        }
        acc.finish(total).await
    }

    async fn authenticate(&self, flow: &FlowDefinition, credentials: &Credentials) -> bool {
        let url = flow.login_target();
        tracing::info!(url, user = %credentials.username, "Logging in");
        match self.driver.login(url, credentials).await {
            Ok(logged_in) => logged_in,
            Err(err) => {
                tracing::warn!(url, error = %err, "Login raised a driver error");
                false
            }
        }
    }

    /// Process one step and return the state for the next.
    async fn run_step(
        &self,
        flow: &FlowDefinition,
        index: usize,
        step: Option<&Step>,
        credentials: Option<&Credentials>,
        state: RunState,
        acc: &mut ResultAccumulator,
    ) -> RunState {
        let importance = step.map(|s| s.importance).unwrap_or_default();

        if !state.admits(importance) {
            let name = step
                .and_then(|s| s.name.as_deref())
                .unwrap_or(UNNAMED_STEP);
            tracing::info!(step = name, "Skipping after blocking failure");
            acc.record(
                Bucket::Skipped,
                StepOutcome::new(name, importance).with_reason(SKIPPED_AFTER_BLOCKING),
            )
            .await;
            return state;
        }

        let name = step
            .and_then(|s| s.name.as_deref())
            .unwrap_or(UNKNOWN_STEP);
        let action = step.map(|s| s.action.as_str()).unwrap_or("");
        acc.emit(RunEvent::StepStarted {
            run_id: acc.run_id(),
            index,
            name: name.to_string(),
            action: action.to_string(),
        })
        .await;

        let kind = ActionKind::parse(action);
        if kind == Some(ActionKind::Navigate)
            && name.to_lowercase().contains("login")
            && self.driver.is_logged_in().await.unwrap_or(false)
        {
            tracing::info!(step = name, "Session already authenticated");
            acc.record(
                Bucket::Passed,
                StepOutcome::new(name, importance).with_status(ALREADY_LOGGED_IN),
            )
            .await;
            return state;
        }

        let started = Instant::now();
        let (Some(step), Some(kind)) = (step, kind) else {
            tracing::warn!(step = name, action, "Unknown action");
            acc.record(
                Bucket::Skipped,
                StepOutcome::new(name, importance)
                    .with_reason(format!("Unknown action: {action}"))
                    .with_duration(started.elapsed().as_secs_f64()),
            )
            .await;
            return state;
        };

        tracing::info!(step = name, action, %importance, "Running step");
        let ctx = StepContext {
            driver: self.driver.as_ref(),
            flow,
            step,
            name,
            importance,
            credentials,
            settings: &self.settings,
        };
        let output = handlers::dispatch(kind, &ctx).await;
        let elapsed = started.elapsed().as_secs_f64();

        let failed = match output {
            Ok(HandlerOutput::Single(verdict)) => {
                let failed = verdict.is_failure();
                acc.record(verdict.bucket, verdict.outcome.with_duration(elapsed))
                    .await;
                failed
            }
            Ok(HandlerOutput::Expanded { verdicts, failed }) => {
                for verdict in verdicts {
                    acc.record(verdict.bucket, verdict.outcome).await;
                }
                failed
            }
            Err(err) => {
                tracing::warn!(step = name, error = %err, "Step raised a driver error");
                acc.record(
                    Bucket::Failed,
                    StepOutcome::new(name, importance)
                        .with_error(err.to_string())
                        .with_duration(elapsed),
                )
                .await;
                true
            }
        };

        if failed {
            tracing::warn!(step = name, %importance, "Step failed");
        }
        state.after(importance, failed)
    }
}
