//! Scriptable in-memory driver for tests and dry runs.

use crate::driver::base::{BrowserDriver, DriverError};
use async_trait::async_trait;
use fq_protocol::flow_models::Credentials;
use fq_protocol::result_models::{AccessibilityViolation, JsError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Driver operations, used to inject failures and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Navigate,
    Click,
    IsVisible,
    InnerText,
    FillForm,
    SubmitForm,
    Screenshot,
    Content,
    Evaluate,
    DiscoverLinks,
    CheckBrokenLinks,
    CheckAccessibility,
    IsLoggedIn,
    Login,
    PageUrl,
    SetViewport,
    WaitForNavigation,
}

#[derive(Debug, Clone)]
struct MockElement {
    visible: bool,
    text: String,
}

#[derive(Debug, Default)]
struct MockState {
    elements: HashMap<String, MockElement>,
    html: String,
    unreachable: HashSet<String>,
    navigation_errors: HashSet<String>,
    redirects: HashMap<String, String>,
    links: Vec<String>,
    broken_links: Vec<String>,
    violations: Vec<AccessibilityViolation>,
    scripts: Vec<(String, serde_json::Value)>,
    width_scripts: Vec<(String, u32, serde_json::Value)>,
    logged_in: bool,
    login_succeeds: bool,
    failures: HashMap<MockOp, u32>,
    revealed_on_submit: Vec<String>,
    js_errors: Vec<JsError>,
    closed: bool,

    current_url: Option<String>,
    viewport: Option<(u32, u32)>,
    calls: Vec<(MockOp, String)>,
    filled: Vec<(String, String)>,
    submitted: Vec<String>,
    screenshots: Vec<PathBuf>,
}

/// An in-memory page whose behavior is configured up front.
///
/// Builder methods consume and return `self`; inspection methods take
/// `&self` so a test can keep an `Arc<MockDriver>` next to the engine.
///
/// ```
/// use fq_core::driver::MockDriver;
///
/// let driver = MockDriver::new()
///     .with_element(".cart")
///     .with_text(".total", "Total: $10");
/// ```
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state().html = "<html><head><title>mock</title></head><body></body></html>".to_string();
        driver.state().login_succeeds = true;
        driver
    }

    /// A visible element with no text.
    pub fn with_element(self, selector: impl Into<String>) -> Self {
        self.state().elements.insert(
            selector.into(),
            MockElement {
                visible: true,
                text: String::new(),
            },
        );
        self
    }

    /// An element present in the DOM but not visible.
    pub fn with_hidden_element(self, selector: impl Into<String>) -> Self {
        self.state().elements.insert(
            selector.into(),
            MockElement {
                visible: false,
                text: String::new(),
            },
        );
        self
    }

    /// A visible element with the given inner text.
    pub fn with_text(self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.state().elements.insert(
            selector.into(),
            MockElement {
                visible: true,
                text: text.into(),
            },
        );
        self
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.state().html = html.into();
        self
    }

    /// `navigate(url)` returns `Ok(false)`.
    pub fn with_unreachable(self, url: impl Into<String>) -> Self {
        self.state().unreachable.insert(url.into());
        self
    }

    /// `navigate(url)` returns a `Navigation` error.
    pub fn with_navigation_error(self, url: impl Into<String>) -> Self {
        self.state().navigation_errors.insert(url.into());
        self
    }

    /// `navigate(from)` lands on `to`.
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.state().redirects.insert(from.into(), to.into());
        self
    }

    /// A visible element that only appears once a form has been submitted.
    pub fn with_element_after_submit(self, selector: impl Into<String>) -> Self {
        self.state().revealed_on_submit.push(selector.into());
        self
    }

    /// A console error reported by the page at `url`.
    pub fn with_js_error(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.state().js_errors.push(JsError {
            url: url.into(),
            message: message.into(),
        });
        self
    }

    pub fn with_links<I, S>(self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_broken_links<I, S>(self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().broken_links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_violations(self, violations: Vec<AccessibilityViolation>) -> Self {
        self.state().violations = violations;
        self
    }

    /// Scripts containing `marker` evaluate to `value`. Unmatched scripts
    /// evaluate to `{}`.
    pub fn with_script_result(self, marker: impl Into<String>, value: serde_json::Value) -> Self {
        self.state().scripts.push((marker.into(), value));
        self
    }

    /// Like [`with_script_result`](Self::with_script_result) but only while
    /// the viewport is `width` pixels wide. Takes precedence.
    pub fn with_script_result_at_width(
        self,
        marker: impl Into<String>,
        width: u32,
        value: serde_json::Value,
    ) -> Self {
        self.state().width_scripts.push((marker.into(), width, value));
        self
    }

    pub fn logged_in(self, logged_in: bool) -> Self {
        self.state().logged_in = logged_in;
        self
    }

    /// Whether `login` authenticates. Defaults to true.
    pub fn with_login_result(self, succeeds: bool) -> Self {
        self.state().login_succeeds = succeeds;
        self
    }

    /// The next `times` calls of `op` fail with an injected error.
    pub fn failing(self, op: MockOp, times: u32) -> Self {
        self.state().failures.insert(op, times);
        self
    }

    pub fn calls(&self) -> Vec<(MockOp, String)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: MockOp) -> usize {
        self.state().calls.iter().filter(|(o, _)| *o == op).count()
    }

    pub fn current_url(&self) -> Option<String> {
        self.state().current_url.clone()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state().viewport
    }

    /// `(selector, value)` pairs in fill order.
    pub fn filled_fields(&self) -> Vec<(String, String)> {
        self.state().filled.clone()
    }

    /// Form selectors in submit order.
    pub fn submitted_forms(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state().screenshots.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call and apply injected failures.
    fn enter(&self, op: MockOp, detail: impl Into<String>) -> Result<MutexGuard<'_, MockState>, DriverError> {
        let mut state = self.state();
        state.calls.push((op, detail.into()));

        if state.closed {
            return Err(DriverError::SessionLost("mock browser closed".to_string()));
        }
        if let Some(remaining) = state.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::Other(format!("injected {op:?} failure")));
            }
        }
        Ok(state)
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<bool, DriverError> {
        let mut state = self.enter(MockOp::Navigate, url)?;
        if state.navigation_errors.contains(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        if state.unreachable.contains(url) {
            return Ok(false);
        }
        let landed = state.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        state.current_url = Some(landed);
        Ok(true)
    }

    async fn click(&self, selector: &str, _timeout_ms: u64) -> Result<(), DriverError> {
        let state = self.enter(MockOp::Click, selector)?;
        if state.elements.contains_key(selector) {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(selector.to_string()))
        }
    }

    async fn is_visible(&self, selector: &str, _timeout_ms: u64) -> Result<bool, DriverError> {
        let state = self.enter(MockOp::IsVisible, selector)?;
        Ok(state.elements.get(selector).is_some_and(|el| el.visible))
    }

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError> {
        let state = self.enter(MockOp::InnerText, selector)?;
        state
            .elements
            .get(selector)
            .map(|el| el.text.clone())
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }

    async fn fill_form(
        &self,
        form_selector: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), DriverError> {
        let mut state = self.enter(MockOp::FillForm, form_selector)?;
        for (selector, value) in fields {
            state.filled.push((selector.clone(), value.clone()));
        }
        Ok(())
    }

    async fn submit_form(
        &self,
        form_selector: &str,
        _last_field: Option<&str>,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        let mut state = self.enter(MockOp::SubmitForm, form_selector)?;
        state.submitted.push(form_selector.to_string());
        for selector in std::mem::take(&mut state.revealed_on_submit) {
            state.elements.insert(
                selector,
                MockElement {
                    visible: true,
                    text: String::new(),
                },
            );
        }
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        self.enter(MockOp::Screenshot, path.display().to_string())?;

        tokio::fs::write(path, b"")
            .await
            .map_err(|err| DriverError::Artifact {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        self.state().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn content(&self) -> Result<String, DriverError> {
        let state = self.enter(MockOp::Content, "")?;
        Ok(state.html.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let state = self.enter(MockOp::Evaluate, script.chars().take(60).collect::<String>())?;

        if let Some((width, _)) = state.viewport {
            let hit = state
                .width_scripts
                .iter()
                .find(|(marker, w, _)| *w == width && script.contains(marker.as_str()));
            if let Some((_, _, value)) = hit {
                return Ok(value.clone());
            }
        }

        let value = state
            .scripts
            .iter()
            .find(|(marker, _)| script.contains(marker.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| serde_json::json!({}));
        Ok(value)
    }

    async fn discover_links(
        &self,
        max_pages: usize,
        nav_selector: Option<&str>,
    ) -> Result<Vec<String>, DriverError> {
        let state = self.enter(MockOp::DiscoverLinks, nav_selector.unwrap_or(""))?;
        Ok(state.links.iter().take(max_pages).cloned().collect())
    }

    async fn check_broken_links(&self) -> Result<Vec<String>, DriverError> {
        let state = self.enter(MockOp::CheckBrokenLinks, "")?;
        Ok(state.broken_links.clone())
    }

    async fn check_accessibility(&self) -> Result<Vec<AccessibilityViolation>, DriverError> {
        let state = self.enter(MockOp::CheckAccessibility, "")?;
        Ok(state.violations.clone())
    }

    async fn is_logged_in(&self) -> Result<bool, DriverError> {
        let state = self.enter(MockOp::IsLoggedIn, "")?;
        Ok(state.logged_in)
    }

    async fn page_url(&self) -> Result<String, DriverError> {
        let state = self.enter(MockOp::PageUrl, "")?;
        Ok(state
            .current_url
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn js_errors(&self) -> Result<Vec<JsError>, DriverError> {
        Ok(std::mem::take(&mut self.state().js_errors))
    }

    async fn login(&self, url: &str, credentials: &Credentials) -> Result<bool, DriverError> {
        let mut state = self.enter(MockOp::Login, format!("{url} as {}", credentials.username))?;
        state.current_url = Some(url.to_string());
        if state.login_succeeds {
            state.logged_in = true;
        }
        Ok(state.login_succeeds)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), DriverError> {
        let mut state = self.enter(MockOp::SetViewport, format!("{width}x{height}"))?;
        state.viewport = Some((width, height));
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<(), DriverError> {
        self.enter(MockOp::WaitForNavigation, timeout_ms.to_string())?;
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_elements() {
        let driver = MockDriver::new()
            .with_element("#go")
            .with_hidden_element("#ghost")
            .with_text(".total", "Total: 10");

        assert!(driver.is_visible("#go", 100).await.unwrap());
        assert!(!driver.is_visible("#ghost", 100).await.unwrap());
        assert!(!driver.is_visible("#missing", 100).await.unwrap());

        assert_eq!(driver.inner_text(".total").await.unwrap(), "Total: 10");
        assert!(matches!(
            driver.inner_text("#missing").await,
            Err(DriverError::ElementNotFound(_))
        ));

        assert!(driver.click("#ghost", 100).await.is_ok());
        assert!(driver.click("#missing", 100).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_navigation_outcomes() {
        let driver = MockDriver::new()
            .with_unreachable("https://a.test/down")
            .with_navigation_error("https://a.test/dns");

        assert!(driver.navigate("https://a.test/").await.unwrap());
        assert_eq!(driver.current_url().as_deref(), Some("https://a.test/"));
        assert!(!driver.navigate("https://a.test/down").await.unwrap());
        assert!(driver.navigate("https://a.test/dns").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_injected_failures_are_transient() {
        let driver = MockDriver::new().with_element("#go").failing(MockOp::Click, 1);

        assert!(driver.click("#go", 100).await.is_err());
        assert!(driver.click("#go", 100).await.is_ok());
        assert_eq!(driver.call_count(MockOp::Click), 2);
    }

    #[tokio::test]
    async fn test_mock_script_results() {
        let driver = MockDriver::new()
            .with_script_result("probe", json!({"a": 1}))
            .with_script_result_at_width("probe", 375, json!({"a": 2}));

        assert_eq!(driver.evaluate("run probe").await.unwrap(), json!({"a": 1}));
        assert_eq!(driver.evaluate("other").await.unwrap(), json!({}));

        driver.set_viewport(375, 667).await.unwrap();
        assert_eq!(driver.evaluate("run probe").await.unwrap(), json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_mock_login_sets_session() {
        let driver = MockDriver::new();
        let credentials = Credentials::new("qa@shop.test", "secret");

        assert!(!driver.is_logged_in().await.unwrap());
        assert!(driver.login("https://shop.test/login", &credentials).await.unwrap());
        assert!(driver.is_logged_in().await.unwrap());

        let failing = MockDriver::new().with_login_result(false);
        assert!(!failing.login("https://shop.test/login", &credentials).await.unwrap());
        assert!(!failing.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_redirect_changes_page_url() {
        let driver = MockDriver::new()
            .with_redirect("https://a.test/account", "https://a.test/login?next=account");

        assert!(driver.navigate("https://a.test/account").await.unwrap());
        assert_eq!(
            driver.page_url().await.unwrap(),
            "https://a.test/login?next=account"
        );
    }

    #[tokio::test]
    async fn test_mock_submit_reveals_elements() {
        let driver = MockDriver::new().with_element_after_submit(".dashboard");

        assert!(!driver.is_visible(".dashboard", 100).await.unwrap());
        driver.submit_form("form", Some("#password"), 100).await.unwrap();

        assert!(driver.is_visible(".dashboard", 100).await.unwrap());
        assert_eq!(driver.submitted_forms(), ["form"]);
    }

    #[tokio::test]
    async fn test_mock_js_errors_drain() {
        let driver = MockDriver::new().with_js_error("https://a.test/", "boom is not defined");

        let errors = driver.js_errors().await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "boom is not defined");
        assert!(driver.js_errors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_close_loses_session() {
        let driver = MockDriver::new();
        driver.close().await.unwrap();

        assert!(matches!(
            driver.navigate("https://a.test/").await,
            Err(DriverError::SessionLost(_))
        ));
    }
}
