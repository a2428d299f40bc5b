//! Page audits: check_ui, test_responsive, check_links,
//! check_accessibility and check_performance.

use crate::config::models::Viewport;
use crate::driver::base::{BrowserDriver, DriverError};
use crate::engine::context::{StepContext, Verdict};
use crate::engine::handlers::{evaluate_as, NAVIGATION_FAILED};
use crate::engine::handlers::navigation::resolve_url;
use crate::engine::retry::{once, with_retries, Enrichment};
use crate::engine::scripts;
use fq_protocol::result_models::{IssueSeverity, PageIssue, PerformanceMetrics};
use serde::Deserialize;

/// Device profiles exercised by the responsive check.
pub const DEVICES: [(&str, u32, u32); 3] = [
    ("Mobile", 375, 667),
    ("Tablet", 768, 1024),
    ("Desktop", 1920, 1080),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiAudit {
    images_without_alt: Vec<String>,
    empty_links: Vec<String>,
    unlabeled_buttons: Vec<String>,
    empty_headings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsiveProbe {
    has_viewport_meta: bool,
    horizontal_scroll: bool,
    unconstrained_images: Vec<String>,
    large_fixed_elements: Vec<String>,
}

fn issue(
    category: &str,
    severity: IssueSeverity,
    message: &str,
    found: &[String],
    device: Option<&str>,
) -> Option<PageIssue> {
    if found.is_empty() {
        return None;
    }
    Some(PageIssue {
        category: category.to_string(),
        severity,
        message: message.to_string(),
        count: found.len() as u32,
        device: device.map(str::to_string),
        example: found.first().cloned(),
    })
}

/// Run the UI audit script on the current page.
pub(crate) async fn ui_issues(driver: &dyn BrowserDriver) -> Result<Vec<PageIssue>, DriverError> {
    let audit: UiAudit = evaluate_as(driver, scripts::UI_AUDIT).await?;
    Ok([
        issue(
            "images",
            IssueSeverity::Moderate,
            "Images without alt text",
            &audit.images_without_alt,
            None,
        ),
        issue(
            "links",
            IssueSeverity::Moderate,
            "Links without text or href",
            &audit.empty_links,
            None,
        ),
        issue(
            "buttons",
            IssueSeverity::Critical,
            "Buttons without an accessible label",
            &audit.unlabeled_buttons,
            None,
        ),
        issue(
            "headings",
            IssueSeverity::Minor,
            "Empty headings",
            &audit.empty_headings,
            None,
        ),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Probe every device profile, then restore `restore`. The viewport is
/// restored even when a probe fails.
pub(crate) async fn responsive_issues(
    driver: &dyn BrowserDriver,
    restore: Viewport,
) -> Result<Vec<PageIssue>, DriverError> {
    let probed = probe_devices(driver).await;
    let restored = driver.set_viewport(restore.width, restore.height).await;
    let issues = probed?;
    restored?;
    Ok(issues)
}

async fn probe_devices(driver: &dyn BrowserDriver) -> Result<Vec<PageIssue>, DriverError> {
    let mut issues = Vec::new();
    for (device, width, height) in DEVICES {
        driver.set_viewport(width, height).await?;
        let probe: ResponsiveProbe = evaluate_as(driver, scripts::RESPONSIVE_PROBE).await?;
        tracing::debug!(device, ?probe, "Responsive probe");

        if !probe.has_viewport_meta {
            issues.push(PageIssue {
                category: "viewport".to_string(),
                severity: IssueSeverity::Critical,
                message: "Missing viewport meta tag".to_string(),
                count: 1,
                device: Some(device.to_string()),
                example: None,
            });
        }
        if probe.horizontal_scroll {
            issues.push(PageIssue {
                category: "layout".to_string(),
                severity: IssueSeverity::Critical,
                message: "Page scrolls horizontally".to_string(),
                count: 1,
                device: Some(device.to_string()),
                example: None,
            });
        }
        issues.extend(issue(
            "images",
            IssueSeverity::Moderate,
            "Images wider than the viewport without max-width: 100%",
            &probe.unconstrained_images,
            Some(device),
        ));
        issues.extend(issue(
            "layout",
            IssueSeverity::Minor,
            "Large fixed elements cover the page",
            &probe.large_fixed_elements,
            Some(device),
        ));
    }
    Ok(issues)
}

pub(super) async fn check_ui(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    Ok(with_retries(ctx, "UI check", Enrichment::None, || async move {
        let issues = ui_issues(ctx.driver).await?;
        Ok(Verdict::passed(ctx.outcome().with_issues(issues)))
    })
    .await)
}

pub(super) async fn test_responsive(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let target = match ctx
        .step
        .url
        .as_deref()
        .map(|url| resolve_url(&ctx.flow.base_url, url))
        .transpose()
    {
        Ok(target) => target,
        Err(err) => return Ok(ctx.fail(format!("{NAVIGATION_FAILED}: {err}"))),
    };
    let target = target.as_deref();
    let restore = ctx.settings.viewport;

    Ok(with_retries(ctx, "Responsive test", Enrichment::None, || async move {
        if let Some(url) = target {
            if !ctx.driver.navigate(url).await? {
                return Ok(ctx.fail(NAVIGATION_FAILED));
            }
        }
        let issues = responsive_issues(ctx.driver, restore).await?;
        Ok(Verdict::passed(ctx.outcome().with_issues(issues)))
    })
    .await)
}

pub(super) async fn check_links(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let fail_on_broken = ctx.step.fail_on_broken.unwrap_or(false);

    Ok(with_retries(ctx, "Link check", Enrichment::None, || async move {
        let broken = ctx.driver.check_broken_links().await?;
        if !broken.is_empty() {
            tracing::info!(step = ctx.name, count = broken.len(), "Broken links found");
        }
        if fail_on_broken && !broken.is_empty() {
            let error = format!("{} broken link(s) found", broken.len());
            Ok(Verdict::failed(
                ctx.outcome().with_error(error).with_broken_links(broken),
            ))
        } else {
            Ok(Verdict::passed(ctx.outcome().with_broken_links(broken)))
        }
    })
    .await)
}

pub(super) async fn check_accessibility(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    Ok(once(ctx, "Accessibility check", || async move {
        let violations = ctx.driver.check_accessibility().await?;
        let (severe, minor): (Vec<_>, Vec<_>) =
            violations.into_iter().partition(|v| v.is_severe());

        if severe.is_empty() {
            Ok(Verdict::passed(ctx.outcome().with_violations(minor)))
        } else {
            let error = format!(
                "Accessibility violations: {} critical/serious issues",
                severe.len()
            );
            Ok(Verdict::failed(
                ctx.outcome().with_error(error).with_violations(severe),
            ))
        }
    })
    .await)
}

pub(super) async fn check_performance(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let budget = ctx.step.max_load_ms;

    Ok(once(ctx, "Performance check", || async move {
        let metrics: PerformanceMetrics =
            evaluate_as(ctx.driver, scripts::PERFORMANCE_TIMING).await?;

        match budget {
            Some(max) if metrics.load_event > max => {
                let error = format!(
                    "Page load took {:.0}ms, over the {:.0}ms budget",
                    metrics.load_event, max
                );
                Ok(Verdict::failed(
                    ctx.outcome().with_error(error).with_performance(metrics),
                ))
            }
            _ => Ok(Verdict::passed(ctx.outcome().with_performance(metrics))),
        }
    })
    .await)
}
