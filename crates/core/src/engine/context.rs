//! Per-step context and handler results.

use crate::config::models::{RunnerConfig, Timeouts, Viewport};
use crate::driver::base::BrowserDriver;
use fq_protocol::flow_models::{Credentials, FlowDefinition, Importance, Step};
use fq_protocol::result_models::{Bucket, StepOutcome};
use std::path::PathBuf;

/// Engine knobs taken from the runner configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Attempts for actions with retry semantics. Never below 1.
    pub retry_attempts: u32,
    pub timeouts: Timeouts,
    pub screenshots_dir: PathBuf,
    /// Viewport restored after a responsive check.
    pub viewport: Viewport,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for EngineSettings {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            retry_attempts: config.retry_attempts.max(1),
            timeouts: config.timeouts.clone(),
            screenshots_dir: config.screenshots_dir.clone(),
            viewport: config.viewport,
        }
    }
}

/// Everything a handler may read while executing one step.
pub(crate) struct StepContext<'a> {
    pub driver: &'a dyn BrowserDriver,
    pub flow: &'a FlowDefinition,
    pub step: &'a Step,
    pub name: &'a str,
    pub importance: Importance,
    pub credentials: Option<&'a Credentials>,
    pub settings: &'a EngineSettings,
}

impl<'a> StepContext<'a> {
    /// A blank outcome carrying this step's name and importance.
    pub fn outcome(&self) -> StepOutcome {
        StepOutcome::new(self.name, self.importance)
    }

    pub fn pass(&self) -> Verdict {
        Verdict::passed(self.outcome())
    }

    pub fn fail(&self, error: impl Into<String>) -> Verdict {
        Verdict::failed(self.outcome().with_error(error))
    }

    /// The step's selector with named references resolved.
    pub fn selector(&self) -> Option<&'a str> {
        let flow = self.flow;
        self.step
            .selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| flow.resolve_selector(s))
    }
}

/// Bucket plus outcome produced by a handler.
#[derive(Debug, Clone)]
pub(crate) struct Verdict {
    pub bucket: Bucket,
    pub outcome: StepOutcome,
}

impl Verdict {
    pub fn passed(outcome: StepOutcome) -> Self {
        Self {
            bucket: Bucket::Passed,
            outcome,
        }
    }

    pub fn failed(outcome: StepOutcome) -> Self {
        Self {
            bucket: Bucket::Failed,
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.bucket == Bucket::Failed
    }
}

/// What a handler hands back to the interpreter.
#[derive(Debug)]
pub(crate) enum HandlerOutput {
    /// One outcome for the step; the interpreter stamps its duration.
    Single(Verdict),
    /// Several outcomes with their own durations (auto-crawl). `failed`
    /// decides whether a blocking step triggers skipping.
    Expanded { verdicts: Vec<Verdict>, failed: bool },
}

impl From<Verdict> for HandlerOutput {
    fn from(verdict: Verdict) -> Self {
        HandlerOutput::Single(verdict)
    }
}
