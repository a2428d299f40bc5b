//! Chromium driver over the DevTools protocol.
//!
//! Only compiled with the `chromium` feature. One browser, one page; every
//! call is bounded by the configured timeouts.

use crate::config::models::{RunnerConfig, Timeouts};
use crate::driver::base::{BrowserDriver, DriverError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use fq_protocol::flow_models::Credentials;
use fq_protocol::result_models::{AccessibilityViolation, JsError};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const LINK_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const LINK_PROBE_CONCURRENCY: usize = 8;

/// Submit controls tried in order inside a form before falling back to Enter.
const SUBMIT_SELECTORS: [&str; 6] = [
    "button[type='submit']",
    "input[type='submit']",
    "button.btn-outline-primary",
    "button.login-button",
    ".login-form button",
    "button",
];

type ErrorSink = Arc<std::sync::Mutex<Vec<JsError>>>;

pub struct ChromiumDriver {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
    js_errors: ErrorSink,
    http: reqwest::Client,
    timeouts: Timeouts,
}

impl ChromiumDriver {
    /// Launch a browser and open a blank page sized to the configured viewport.
    pub async fn launch(config: &RunnerConfig) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .request_timeout(Duration::from_millis(config.timeouts.navigation_ms));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(DriverError::NotAvailable)?;

        let (browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(|err| DriverError::NotAvailable(err.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "CDP handler error");
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;

        let js_errors = ErrorSink::default();
        let listeners = vec![
            watch_console(&page, js_errors.clone()).await?,
            watch_exceptions(&page, js_errors.clone()).await?,
        ];

        let http = reqwest::Client::builder()
            .timeout(LINK_PROBE_TIMEOUT)
            .build()
            .map_err(|err| DriverError::NotAvailable(err.to_string()))?;

        tracing::info!(headless = config.headless, "Launched Chromium");

        let driver = Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            listeners,
            js_errors,
            http,
            timeouts: config.timeouts.clone(),
        };
        driver
            .set_viewport(config.viewport.width, config.viewport.height)
            .await?;
        Ok(driver)
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, DriverError> {
        let value = self.evaluate(&script).await?;
        serde_json::from_value(value).map_err(|err| DriverError::Script(err.to_string()))
    }

    /// Poll `selector` until it is visible or the deadline passes.
    async fn poll_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool, DriverError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let visible: bool = self.eval(visibility_script(selector)).await?;
            if visible {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let filled: bool = self.eval(fill_script(selector, value)).await?;
        if filled {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(selector.to_string()))
        }
    }

    async fn probe_link(&self, link: String) -> Option<String> {
        let response = match self.http.head(&link).send().await {
            Ok(response) if matches!(response.status().as_u16(), 405 | 501) => {
                self.http.get(&link).send().await
            }
            other => other,
        };
        match response {
            Ok(response) if response.status().as_u16() >= 400 => {
                Some(format!("{link} (Status: {})", response.status().as_u16()))
            }
            Ok(_) => None,
            Err(_) => Some(format!("{link} (Failed to connect)")),
        }
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<bool, DriverError> {
        let loaded = bounded("navigation", self.timeouts.navigation_ms, async {
            match self.page.goto(url).await {
                Ok(_) => Ok(true),
                Err(err) if err.to_string().contains("net::ERR") => {
                    tracing::warn!(url, error = %err, "Navigation refused");
                    Ok(false)
                }
                Err(err) => Err(DriverError::Navigation {
                    url: url.to_string(),
                    reason: err.to_string(),
                }),
            }
        })
        .await?;
        if !loaded {
            return Ok(false);
        }

        let status: Option<u16> = self.eval(NAVIGATION_STATUS_SCRIPT.to_string()).await?;
        Ok(status.map_or(true, |status| status == 0 || status < 400))
    }

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<(), DriverError> {
        bounded(&format!("selector {selector}"), timeout_ms, async {
            loop {
                if let Ok(element) = self.page.find_element(selector).await {
                    element.click().await.map_err(cdp_error)?;
                    return Ok(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
    }

    async fn is_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool, DriverError> {
        self.poll_visible(selector, timeout_ms).await
    }

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError> {
        let text: Option<String> = bounded(
            &format!("selector {selector}"),
            self.timeouts.element_ms,
            self.eval(inner_text_script(selector)),
        )
        .await?;
        text.ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }

    async fn fill_form(
        &self,
        form_selector: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), DriverError> {
        if !self.poll_visible(form_selector, self.timeouts.element_ms).await? {
            return Err(DriverError::ElementNotFound(form_selector.to_string()));
        }
        for (selector, value) in fields {
            self.fill(&format!("{form_selector} {selector}"), value).await?;
        }
        Ok(())
    }

    async fn submit_form(
        &self,
        form_selector: &str,
        last_field: Option<&str>,
        timeout_ms: u64,
    ) -> Result<(), DriverError> {
        let mut submitted = false;
        for control in SUBMIT_SELECTORS {
            let selector = format!("{form_selector} {control}");
            let visible: bool = self.eval(visibility_script(&selector)).await?;
            if !visible {
                continue;
            }
            match self.click(&selector, self.timeouts.element_ms).await {
                Ok(()) => {
                    tracing::debug!(selector = %selector, "Clicked submit control");
                    submitted = true;
                    break;
                }
                Err(err) => tracing::debug!(selector = %selector, error = %err, "Submit control not clickable"),
            }
        }

        if !submitted {
            let Some(field) = last_field else {
                return Err(DriverError::ElementNotFound(format!(
                    "{form_selector} submit control"
                )));
            };
            let field = format!("{form_selector} {field}");
            tracing::debug!(field = %field, "No submit control, pressing Enter");
            let element = self
                .page
                .find_element(field.as_str())
                .await
                .map_err(|_| DriverError::ElementNotFound(field.clone()))?;
            element.press_key("Enter").await.map_err(cdp_error)?;
        }

        if let Err(err) = self.wait_for_navigation(timeout_ms).await {
            tracing::warn!(form = form_selector, error = %err, "Navigation after form submit did not complete");
        }
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|err| DriverError::Artifact {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.page.content().await.map_err(cdp_error)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate_expression(script)
            .await
            .map_err(|err| DriverError::Script(err.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn discover_links(
        &self,
        max_pages: usize,
        nav_selector: Option<&str>,
    ) -> Result<Vec<String>, DriverError> {
        let links: Vec<String> = self.eval(discover_links_script(nav_selector)).await?;
        Ok(links.into_iter().take(max_pages).collect())
    }

    async fn check_broken_links(&self) -> Result<Vec<String>, DriverError> {
        let survey: LinkSurvey = self.eval(LINK_SURVEY_SCRIPT.to_string()).await?;

        let mut broken = survey.anchor_problems;
        let probed: Vec<Option<String>> = futures::stream::iter(survey.http_links)
            .map(|link| self.probe_link(link))
            .buffer_unordered(LINK_PROBE_CONCURRENCY)
            .collect()
            .await;
        broken.extend(probed.into_iter().flatten());
        broken.sort();
        Ok(broken)
    }

    async fn check_accessibility(&self) -> Result<Vec<AccessibilityViolation>, DriverError> {
        self.eval(ACCESSIBILITY_SCRIPT.to_string()).await
    }

    async fn is_logged_in(&self) -> Result<bool, DriverError> {
        self.eval(LOGGED_IN_SCRIPT.to_string()).await
    }

    async fn page_url(&self) -> Result<String, DriverError> {
        let url = self.page.url().await.map_err(cdp_error)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn js_errors(&self) -> Result<Vec<JsError>, DriverError> {
        let mut errors = self.js_errors.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::take(&mut *errors))
    }

    async fn login(&self, url: &str, credentials: &Credentials) -> Result<bool, DriverError> {
        if !self.navigate(url).await? {
            return Ok(false);
        }
        let element_ms = self.timeouts.element_ms;
        if !self.poll_visible(&credentials.username_selector, element_ms).await?
            || !self.poll_visible(&credentials.password_selector, element_ms).await?
        {
            tracing::warn!(url, "Login form not found");
            return Ok(false);
        }

        self.fill(&credentials.username_selector, &credentials.username)
            .await?;
        self.fill(&credentials.password_selector, &credentials.password)
            .await?;

        // Some forms only react to Enter, others only to the button.
        let password = self
            .page
            .find_element(&credentials.password_selector)
            .await
            .map_err(cdp_error)?;
        let (enter, click) = tokio::join!(
            password.press_key("Enter"),
            self.click(&credentials.submit_selector, element_ms)
        );
        if let Err(err) = enter {
            tracing::debug!(error = %err, "Enter on password field failed");
        }
        if let Err(err) = click {
            tracing::debug!(error = %err, "Submit click failed");
        }

        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.timeouts.post_click_ms);
        while tokio::time::Instant::now() < deadline {
            if self.is_logged_in().await.unwrap_or(false) {
                return Ok(true);
            }
            tokio::time::sleep(POLL_INTERVAL * 5).await;
        }
        Ok(false)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), DriverError> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), 1.0, false);
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<(), DriverError> {
        bounded("navigation", timeout_ms, async {
            self.page.wait_for_navigation().await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<(), DriverError> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        browser.close().await.map_err(cdp_error)?;
        let _ = browser.wait().await;
        self.handler.abort();
        for listener in &self.listeners {
            listener.abort();
        }
        Ok(())
    }
}

async fn bounded<T, F>(what: &str, timeout_ms: u64, operation: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), operation)
        .await
        .map_err(|_| DriverError::Timeout {
            what: what.to_string(),
            timeout_ms,
        })?
}

/// Collect `console.error` calls into `sink`.
async fn watch_console(page: &Page, sink: ErrorSink) -> Result<JoinHandle<()>, DriverError> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(cdp_error)?;
    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if !matches!(event.r#type, ConsoleApiCalledType::Error) {
                continue;
            }
            let message = event
                .args
                .iter()
                .filter_map(remote_text)
                .collect::<Vec<_>>()
                .join(" ");
            record_js_error(&page, &sink, message).await;
        }
    }))
}

/// Collect uncaught exceptions into `sink`.
async fn watch_exceptions(page: &Page, sink: ErrorSink) -> Result<JoinHandle<()>, DriverError> {
    let mut events = page
        .event_listener::<EventExceptionThrown>()
        .await
        .map_err(cdp_error)?;
    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let details = &event.exception_details;
            let message = details
                .exception
                .as_ref()
                .and_then(|exception| exception.description.clone())
                .unwrap_or_else(|| details.text.clone());
            record_js_error(&page, &sink, message).await;
        }
    }))
}

async fn record_js_error(page: &Page, sink: &ErrorSink, message: String) {
    let url = page.url().await.ok().flatten().unwrap_or_default();
    tracing::error!(url = %url, message = %message, "JavaScript error on page");
    sink.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(JsError { url, message });
}

fn remote_text(object: &RemoteObject) -> Option<String> {
    match &object.value {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(value) => Some(value.to_string()),
        None => object.description.clone(),
    }
}

fn cdp_error(err: CdpError) -> DriverError {
    let message = err.to_string();
    if message.contains("channel") || message.contains("closed") {
        DriverError::SessionLost(message)
    } else {
        DriverError::Other(message)
    }
}

/// JSON-quote a value for splicing into a script.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn visibility_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  const style = window.getComputedStyle(el);
  const rect = el.getBoundingClientRect();
  return style.display !== 'none' && style.visibility !== 'hidden' && rect.width > 0 && rect.height > 0;
}})()"#,
        sel = js_string(selector)
    )
}

fn inner_text_script(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({sel}); return el ? el.innerText : null; }})()",
        sel = js_string(selector)
    )
}

fn fill_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  el.focus();
  const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype
    : el instanceof HTMLSelectElement ? HTMLSelectElement.prototype
    : HTMLInputElement.prototype;
  const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
  setter.call(el, {val});
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

fn discover_links_script(nav_selector: Option<&str>) -> String {
    let scope = nav_selector.map_or_else(|| "null".to_string(), js_string);
    format!(
        r#"(() => {{
  const scopeSelector = {scope};
  const root = scopeSelector ? document.querySelector(scopeSelector) : document;
  if (!root) return [];
  const seen = new Set();
  const links = [];
  for (const a of root.querySelectorAll('a[href]')) {{
    const raw = a.getAttribute('href') || '';
    if (!raw || raw.startsWith('#') || raw.startsWith('javascript:') || raw.startsWith('mailto:') || raw.startsWith('tel:')) continue;
    let url;
    try {{ url = new URL(raw, location.href); }} catch (e) {{ continue; }}
    if (url.origin !== location.origin) continue;
    url.hash = '';
    const href = url.toString();
    if (href === location.href || seen.has(href)) continue;
    seen.add(href);
    links.push(href);
  }}
  return links;
}})()"#
    )
}

#[derive(Deserialize)]
struct LinkSurvey {
    #[serde(default)]
    http_links: Vec<String>,
    #[serde(default)]
    anchor_problems: Vec<String>,
}

const NAVIGATION_STATUS_SCRIPT: &str = r#"(() => {
  const nav = performance.getEntriesByType('navigation')[0];
  return nav && typeof nav.responseStatus === 'number' ? nav.responseStatus : null;
})()"#;

const LINK_SURVEY_SCRIPT: &str = r#"(() => {
  const http_links = new Set();
  const anchor_problems = [];
  for (const a of document.querySelectorAll('a[href]')) {
    const raw = a.getAttribute('href') || '';
    if (!raw || raw.startsWith('javascript:')) continue;
    if (raw.startsWith('#')) {
      const id = raw.slice(1);
      if (!id) anchor_problems.push('Empty anchor link: ' + raw);
      else if (!document.getElementById(id)) anchor_problems.push('Anchor link #' + id + ' missing target element');
      continue;
    }
    try {
      const url = new URL(raw, location.href);
      if (url.protocol === 'http:' || url.protocol === 'https:') http_links.add(url.toString());
    } catch (e) {}
  }
  return { http_links: Array.from(http_links), anchor_problems };
})()"#;

const LOGGED_IN_SCRIPT: &str = r#"(() => {
  const password = document.querySelector('input[type="password"]');
  if (password && password.offsetParent !== null) return false;
  const markers = 'a[href*="logout"], a[href*="signout"], a[href*="sign-out"], button[name="logout"], form[action*="logout"]';
  if (document.querySelector(markers)) return true;
  const text = (document.body ? document.body.innerText : '').toLowerCase();
  return text.includes('log out') || text.includes('logout') || text.includes('sign out');
})()"#;

const ACCESSIBILITY_SCRIPT: &str = r#"(() => {
  const violations = [];
  const push = (id, impact, description, help, nodes) => {
    if (nodes > 0) violations.push({ id, impact, description, help, nodes });
  };
  push('image-alt', 'critical', 'Images must have alternate text',
    'Add an alt attribute to every img element',
    document.querySelectorAll('img:not([alt])').length);
  const unlabeled = Array.from(document.querySelectorAll('input:not([type=hidden]):not([type=submit]):not([type=button]), select, textarea'))
    .filter(el => !el.getAttribute('aria-label') && !el.getAttribute('aria-labelledby') && !(el.id && document.querySelector('label[for="' + el.id + '"]')) && !el.closest('label'));
  push('label', 'critical', 'Form elements must have labels',
    'Associate a label with every form control', unlabeled.length);
  const nameless = Array.from(document.querySelectorAll('button, [role=button]'))
    .filter(el => !(el.innerText || '').trim() && !el.getAttribute('aria-label') && !el.getAttribute('title'));
  push('button-name', 'critical', 'Buttons must have discernible text',
    'Give every button text or an aria-label', nameless.length);
  const emptyLinks = Array.from(document.querySelectorAll('a[href]'))
    .filter(el => !(el.innerText || '').trim() && !el.getAttribute('aria-label') && !el.querySelector('img[alt]'));
  push('link-name', 'serious', 'Links must have discernible text',
    'Give every link text or an aria-label', emptyLinks.length);
  push('html-has-lang', 'serious', 'The html element must have a lang attribute',
    'Set lang on the html element', document.documentElement.getAttribute('lang') ? 0 : 1);
  push('document-title', 'serious', 'Documents must have a title element',
    'Add a non-empty title', (document.title || '').trim() ? 0 : 1);
  const headings = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6'));
  let skipped = 0;
  for (let i = 1; i < headings.length; i++) {
    if (Number(headings[i].tagName[1]) - Number(headings[i - 1].tagName[1]) > 1) skipped++;
  }
  push('heading-order', 'moderate', 'Heading levels should only increase by one',
    'Do not skip heading levels', skipped);
  return violations;
})()"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a[name="x"]"#), r#""a[name=\"x\"]""#);
    }

    #[test]
    fn test_discover_links_script_scopes() {
        assert!(discover_links_script(None).contains("const scopeSelector = null;"));
        assert!(discover_links_script(Some("nav a")).contains(r#"const scopeSelector = "nav a";"#));
    }
}
