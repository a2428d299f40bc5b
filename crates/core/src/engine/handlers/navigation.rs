//! Page-driving handlers: navigate, click, fill_form, wait, screenshot.

use crate::driver::base::DriverError;
use crate::engine::context::{StepContext, Verdict};
use crate::engine::diagnostics::{save_screenshot, screenshot_path};
use crate::engine::handlers::{MISSING_SELECTOR, NAVIGATION_FAILED};
use crate::engine::retry::{once, with_retries, Enrichment};
use chrono::Utc;
use fq_protocol::flow_models::Credentials;
use fq_protocol::result_models::{IssueSeverity, PageIssue};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_WAIT_MS: u64 = 1000;
const DEFAULT_FORM_SELECTOR: &str = "form";

pub const SESSION_LOST: &str = "Redirected to login page (session lost)";

/// Resolve a step URL against the flow's base URL. Absolute and
/// scheme-relative URLs replace the base.
pub fn resolve_url(base_url: &str, url: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(base_url)?.join(url)?.to_string())
}

/// A page that lands on a login URL it did not ask for has lost its session.
fn redirected_to_login(requested: &str, landed: &str) -> bool {
    landed.to_lowercase().contains("login") && !requested.to_lowercase().contains("login")
}

pub(super) async fn navigate(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let requested = ctx.step.url.as_deref().unwrap_or("/");
    let target = match resolve_url(&ctx.flow.base_url, requested) {
        Ok(target) => target,
        Err(err) => {
            tracing::warn!(step = ctx.name, base_url = %ctx.flow.base_url, url = requested, error = %err, "Invalid URL");
            return Ok(ctx.fail(format!("{NAVIGATION_FAILED}: {err}")));
        }
    };
    let target = target.as_str();
    tracing::debug!(step = ctx.name, url = target, "Navigating");

    Ok(with_retries(ctx, "Navigation", Enrichment::None, || async move {
        if !ctx.driver.navigate(target).await? {
            return Ok(Verdict::failed(
                ctx.outcome().with_url(target).with_error(NAVIGATION_FAILED),
            ));
        }

        let landed = ctx.driver.page_url().await?;
        if redirected_to_login(target, &landed) {
            tracing::warn!(step = ctx.name, url = target, landed = %landed, "Session lost");
            let issue = PageIssue {
                category: "Session".to_string(),
                severity: IssueSeverity::Critical,
                message: SESSION_LOST.to_string(),
                count: 1,
                device: None,
                example: Some(landed),
            };
            return Ok(Verdict::failed(
                ctx.outcome()
                    .with_url(target)
                    .with_error(SESSION_LOST)
                    .with_issues(vec![issue]),
            ));
        }
        Ok(Verdict::passed(ctx.outcome().with_url(target)))
    })
    .await)
}

pub(super) async fn click(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let Some(selector) = ctx.selector() else {
        return Ok(ctx.fail(MISSING_SELECTOR));
    };
    let timeouts = &ctx.settings.timeouts;
    let wait_for_navigation = ctx.step.wait_for_navigation.unwrap_or(false);
    let enrichment = Enrichment::Diagnostics {
        selector,
        expected_text: None,
    };

    Ok(with_retries(ctx, "Click", enrichment, || async move {
        ctx.driver.click(selector, timeouts.element_ms).await?;
        if wait_for_navigation {
            ctx.driver.wait_for_navigation(timeouts.post_click_ms).await?;
        }
        Ok(ctx.pass())
    })
    .await)
}

pub(super) async fn fill_form(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let form_selector = ctx
        .step
        .form_selector
        .as_deref()
        .map(|s| ctx.flow.resolve_selector(s))
        .unwrap_or(DEFAULT_FORM_SELECTOR);
    let fields: BTreeMap<String, String> = ctx
        .step
        .fields
        .iter()
        .map(|(selector, value)| {
            (
                ctx.flow.resolve_selector(selector).to_string(),
                substitute_placeholders(value, ctx.credentials),
            )
        })
        .collect();
    let fields = &fields;

    let filled = with_retries(ctx, "Form fill", Enrichment::None, || async move {
        ctx.driver.fill_form(form_selector, fields).await?;
        Ok(ctx.pass())
    })
    .await;
    if filled.is_failure() {
        return Ok(filled);
    }

    // Single attempt; the form must not be posted twice.
    let last_field = fields.keys().next_back().map(String::as_str);
    let timeout_ms = ctx.settings.timeouts.post_click_ms;
    Ok(once(ctx, "Form submit", || async move {
        ctx.driver
            .submit_form(form_selector, last_field, timeout_ms)
            .await?;
        Ok(ctx.pass())
    })
    .await)
}

pub(super) async fn wait(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let millis = ctx.step.duration.unwrap_or(DEFAULT_WAIT_MS);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Ok(ctx.pass())
}

pub(super) async fn screenshot(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let path = match ctx.step.path.as_deref() {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => screenshot_path(&ctx.settings.screenshots_dir, ctx.name, Utc::now()),
    };
    let path = path.as_path();

    Ok(once(ctx, "Screenshot", || async move {
        save_screenshot(ctx, path).await?;
        Ok(Verdict::passed(
            ctx.outcome().with_screenshot(path.display().to_string()),
        ))
    })
    .await)
}

/// Replace `{{name}}` with the credential attribute of that name. Unknown
/// names, and all tokens when no credentials were supplied, are left as is.
pub(crate) fn substitute_placeholders(value: &str, credentials: Option<&Credentials>) -> String {
    let Some(credentials) = credentials else {
        return value.to_string();
    };

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let token = &rest[start..start + 2 + len + 2];
        let name = rest[start + 2..start + 2 + len].trim();

        out.push_str(&rest[..start]);
        match credentials.attribute(name) {
            Some(replacement) => out.push_str(replacement),
            None => {
                tracing::debug!(placeholder = name, "No credential attribute for placeholder");
                out.push_str(token);
            }
        }
        rest = &rest[start + token.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(base_url: &str, url: &str) -> String {
        resolve_url(base_url, url).expect("URL should resolve")
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolved("https://shop.test/", "/cart"), "https://shop.test/cart");
        assert_eq!(resolved("https://shop.test", "cart"), "https://shop.test/cart");
        assert_eq!(resolved("https://shop.test", "/"), "https://shop.test/");
        assert_eq!(resolved("https://shop.test", "https://cdn.test/x"), "https://cdn.test/x");
        assert_eq!(resolved("https://shop.test", "http-status"), "https://shop.test/http-status");
        assert_eq!(resolved("https://shop.test", "//cdn.test/app.js"), "https://cdn.test/app.js");
        assert_eq!(
            resolved("https://shop.test/app/index.html", "cart"),
            "https://shop.test/app/cart"
        );
    }

    #[test]
    fn test_resolve_url_rejects_relative_base() {
        assert!(resolve_url("shop.test", "/cart").is_err());
    }

    #[test]
    fn test_redirected_to_login() {
        assert!(redirected_to_login("https://shop.test/account", "https://shop.test/login?next=/account"));
        assert!(!redirected_to_login("https://shop.test/login", "https://shop.test/login"));
        assert!(!redirected_to_login("https://shop.test/account", "https://shop.test/account"));
    }

    #[test]
    fn test_substitute_placeholders() {
        let credentials = Credentials::new("qa@shop.test", "s3cret");

        assert_eq!(
            substitute_placeholders("{{username}}", Some(&credentials)),
            "qa@shop.test"
        );
        assert_eq!(
            substitute_placeholders("user={{ username }}&pw={{password}}", Some(&credentials)),
            "user=qa@shop.test&pw=s3cret"
        );
        assert_eq!(
            substitute_placeholders("{{otp}} {{password", Some(&credentials)),
            "{{otp}} {{password"
        );
        assert_eq!(substitute_placeholders("{{username}}", None), "{{username}}");
    }
}
