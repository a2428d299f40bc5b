//! Browser driver trait and supporting types.
//!
//! The engine talks to the page only through [`BrowserDriver`]. Every call
//! carries its own timeout so a hung page surfaces as a
//! [`DriverError::Timeout`] instead of stalling the run.

use async_trait::async_trait;
use fq_protocol::flow_models::Credentials;
use fq_protocol::result_models::{AccessibilityViolation, JsError};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Browser not available: {0}")]
    NotAvailable(String),
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Failed to write artifact {path}: {reason}")]
    Artifact { path: String, reason: String },
    #[error("Browser session lost: {0}")]
    SessionLost(String),
    #[error("Driver error: {0}")]
    Other(String),
}

/// Operations the flow engine needs from a browser page.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url`. `Ok(false)` means the page answered but the load did not
    /// succeed (error status or refused), which is a step failure rather
    /// than a driver fault.
    async fn navigate(&self, url: &str) -> Result<bool, DriverError>;

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<(), DriverError>;

    /// Whether `selector` becomes visible within `timeout_ms`. A missing
    /// element is `Ok(false)`.
    async fn is_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool, DriverError>;

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError>;

    /// Fill `fields` (selector to value) inside `form_selector`.
    async fn fill_form(
        &self,
        form_selector: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), DriverError>;

    /// Submit `form_selector` by clicking its first visible submit control,
    /// or by pressing Enter in `last_field` when it has none, then wait up
    /// to `timeout_ms` for the resulting navigation. A navigation that does
    /// not arrive in time is not an error.
    async fn submit_form(
        &self,
        form_selector: &str,
        last_field: Option<&str>,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    /// Save a screenshot of the current page. The parent directory must exist.
    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;

    /// Current page HTML.
    async fn content(&self) -> Result<String, DriverError>;

    /// Evaluate a script and return its JSON-serializable result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    /// Same-origin links on the current page, scoped to `nav_selector` when
    /// given, deduplicated and capped at `max_pages`.
    async fn discover_links(
        &self,
        max_pages: usize,
        nav_selector: Option<&str>,
    ) -> Result<Vec<String>, DriverError>;

    /// Links on the current page that fail to resolve, described for humans.
    async fn check_broken_links(&self) -> Result<Vec<String>, DriverError>;

    async fn check_accessibility(&self) -> Result<Vec<AccessibilityViolation>, DriverError>;

    async fn is_logged_in(&self) -> Result<bool, DriverError>;

    /// URL of the page as loaded, after redirects.
    async fn page_url(&self) -> Result<String, DriverError>;

    /// Console errors and uncaught exceptions seen since the last call.
    async fn js_errors(&self) -> Result<Vec<JsError>, DriverError>;

    /// Authenticate at `url`. `Ok(false)` means the form was submitted but
    /// the session did not become authenticated.
    async fn login(&self, url: &str, credentials: &Credentials) -> Result<bool, DriverError>;

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), DriverError>;

    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<(), DriverError>;

    /// Release the browser. Further calls fail with `SessionLost`.
    async fn close(&self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_their_subject() {
        let err = DriverError::ElementNotFound("#cart".to_string());
        assert_eq!(err.to_string(), "Element not found: #cart");

        let err = DriverError::Timeout {
            what: "selector .total".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for selector .total"
        );

        let err = DriverError::Navigation {
            url: "https://shop.test/".to_string(),
            reason: "net::ERR_CONNECTION_REFUSED".to_string(),
        };
        assert!(err.to_string().contains("https://shop.test/"));
    }
}
