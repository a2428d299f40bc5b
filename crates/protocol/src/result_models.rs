//! Run result models handed to report consumers.
//!
//! A run produces one [`FlowExecutionResult`]: three ordered outcome
//! buckets plus a [`CoverageSummary`] derived from them.

use crate::flow_models::Importance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

/// Placeholder used when an outcome would otherwise have no step name.
pub const MISSING_STEP_NAME: &str = "[Step name missing]";

/// Placeholder used when a failure would otherwise have no error message.
pub const MISSING_ERROR: &str = "[No error message provided]";

/// Maximum number of characters of page HTML kept on a failure.
pub const HTML_SNIPPET_LIMIT: usize = 1000;

/// The three outcome lists of a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bucket::Passed => "passed",
            Bucket::Failed => "failed",
            Bucket::Skipped => "skipped",
        })
    }
}

/// One accessibility rule violation as reported by the driver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AccessibilityViolation {
    pub id: String,

    /// `minor`, `moderate`, `serious` or `critical`.
    #[serde(default)]
    pub impact: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub help: String,

    /// Number of offending nodes.
    #[serde(default)]
    pub nodes: u32,
}

impl AccessibilityViolation {
    /// Whether this violation is severe enough to fail a step.
    pub fn is_severe(&self) -> bool {
        matches!(self.impact.as_deref(), Some("critical") | Some("serious"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Moderate,
    Minor,
}

/// A UI or responsive-layout finding attached to a passing step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PageIssue {
    pub category: String,
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(default)]
    pub count: u32,
    /// Device profile the issue was observed on (responsive checks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Navigation timing in milliseconds relative to navigation start.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub dom_content_loaded: f64,
    #[serde(default)]
    pub load_event: f64,
    #[serde(default)]
    pub response_start: f64,
    #[serde(default)]
    pub response_end: f64,
    #[serde(default)]
    pub first_contentful_paint: Option<f64>,
}

/// The recorded result of one step (or one auto-crawl sub-step).
///
/// Which optional fields are set depends on the bucket: failures carry
/// `error` and possibly diagnostics, skips carry `reason`, passes may carry
/// a payload from the handler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StepOutcome {
    pub step: String,

    /// Wall-clock seconds spent in the handler.
    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub importance: Importance,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_snippet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath_suggestion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<AccessibilityViolation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<PageIssue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broken_links: Vec<String>,
}

impl StepOutcome {
    pub fn new(step: impl Into<String>, importance: Importance) -> Self {
        Self {
            step: step.into(),
            duration: 0.0,
            importance,
            error: None,
            reason: None,
            status: None,
            url: None,
            screenshot: None,
            html_snippet: None,
            xpath_suggestion: None,
            performance: None,
            violations: Vec::new(),
            issues: Vec::new(),
            broken_links: Vec::new(),
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_screenshot(mut self, path: impl Into<String>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    /// Attach page HTML, truncated to [`HTML_SNIPPET_LIMIT`] characters.
    pub fn with_html_snippet(mut self, html: &str) -> Self {
        self.html_snippet = Some(html.chars().take(HTML_SNIPPET_LIMIT).collect());
        self
    }

    pub fn with_xpath_suggestion(mut self, xpath: impl Into<String>) -> Self {
        self.xpath_suggestion = Some(xpath.into());
        self
    }

    pub fn with_performance(mut self, metrics: PerformanceMetrics) -> Self {
        self.performance = Some(metrics);
        self
    }

    pub fn with_violations(mut self, violations: Vec<AccessibilityViolation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn with_issues(mut self, issues: Vec<PageIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_broken_links(mut self, links: Vec<String>) -> Self {
        self.broken_links = links;
        self
    }
}

/// Aggregate counts derived from the three buckets after a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct CoverageSummary {
    /// Number of authored steps, not counting auto-crawl sub-steps.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
}

impl CoverageSummary {
    /// Project a summary from the buckets. Pure: the same buckets always
    /// give the same summary.
    pub fn from_buckets(
        total: usize,
        passed: &[StepOutcome],
        failed: &[StepOutcome],
        skipped: &[StepOutcome],
    ) -> Self {
        Self {
            total,
            passed: passed.len(),
            failed: failed.len(),
            skipped: skipped.len(),
            failed_steps: failed.iter().map(|o| o.step.clone()).collect(),
            skipped_steps: skipped.iter().map(|o| o.step.clone()).collect(),
        }
    }
}

/// A console error or uncaught exception seen on a page during the run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct JsError {
    /// Page URL at the time of the error.
    pub url: String,
    pub message: String,
}

/// The complete, read-only result of one flow run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct FlowExecutionResult {
    #[ts(type = "string")]
    pub run_id: Uuid,

    pub flow_name: String,

    pub environment: String,

    pub timestamp: DateTime<Utc>,

    pub passed: Vec<StepOutcome>,

    pub failed: Vec<StepOutcome>,

    pub skipped: Vec<StepOutcome>,

    /// Page-side JavaScript errors collected while the flow ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub js_errors: Vec<JsError>,

    /// Set once, after the last step has been recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_summary: Option<CoverageSummary>,
}

impl FlowExecutionResult {
    pub fn new(flow_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            flow_name: flow_name.into(),
            environment: environment.into(),
            timestamp: Utc::now(),
            passed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            js_errors: Vec::new(),
            coverage_summary: None,
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[StepOutcome] {
        match bucket {
            Bucket::Passed => &self.passed,
            Bucket::Failed => &self.failed,
            Bucket::Skipped => &self.skipped,
        }
    }

    /// Whether the run recorded no failures.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
