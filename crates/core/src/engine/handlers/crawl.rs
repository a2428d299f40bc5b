//! Auto-crawl: expand one step into a sub-run over discovered pages.

use crate::driver::base::DriverError;
use crate::engine::context::{HandlerOutput, StepContext, Verdict};
use crate::engine::handlers::audits::{responsive_issues, ui_issues};
use crate::engine::handlers::NAVIGATION_FAILED;
use fq_protocol::flow_models::Importance;
use fq_protocol::result_models::StepOutcome;
use std::time::Instant;

pub const DEFAULT_MAX_PAGES: usize = 10;
pub const NO_LINKS_FOUND: &str = "No internal links found to crawl";

/// Discover links and check each page.
///
/// No links is a hard failure with importance forced to `critical`. With
/// links, every page yields one passed sub-outcome when its navigation
/// succeeds, plus one failed sub-outcome per audit that errored. A page
/// whose navigation fails yields a single failed sub-outcome.
pub(super) async fn auto_crawl(ctx: &StepContext<'_>) -> Result<HandlerOutput, DriverError> {
    let max_pages = ctx.step.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
    let links = ctx
        .driver
        .discover_links(max_pages, ctx.flow.nav_selector.as_deref())
        .await?;

    if links.is_empty() {
        tracing::warn!(step = ctx.name, "Auto-crawl found no links");
        let outcome = StepOutcome::new(ctx.name, Importance::Critical)
            .with_error(NO_LINKS_FOUND)
            .with_duration(0.0);
        return Ok(HandlerOutput::Expanded {
            verdicts: vec![Verdict::failed(outcome)],
            failed: true,
        });
    }

    tracing::info!(step = ctx.name, pages = links.len(), "Crawling discovered pages");
    let mut verdicts = Vec::new();
    for (index, url) in links.iter().enumerate() {
        let page = format!("Crawl Page {}: {url}", index + 1);
        let started = Instant::now();

        match ctx.driver.navigate(url).await {
            Ok(true) => {}
            Ok(false) => {
                verdicts.push(sub_failure(&page, NAVIGATION_FAILED, started));
                continue;
            }
            Err(err) => {
                verdicts.push(sub_failure(&page, &err.to_string(), started));
                continue;
            }
        }

        let mut issues = Vec::new();
        let check_started = Instant::now();
        match ui_issues(ctx.driver).await {
            Ok(found) => issues.extend(found),
            Err(err) => verdicts.push(sub_failure(
                &format!("{page} (UI check)"),
                &err.to_string(),
                check_started,
            )),
        }

        let check_started = Instant::now();
        match responsive_issues(ctx.driver, ctx.settings.viewport).await {
            Ok(found) => issues.extend(found),
            Err(err) => verdicts.push(sub_failure(
                &format!("{page} (Responsive check)"),
                &err.to_string(),
                check_started,
            )),
        }

        verdicts.push(Verdict::passed(
            StepOutcome::new(page, Importance::Normal)
                .with_url(url.as_str())
                .with_issues(issues)
                .with_duration(started.elapsed().as_secs_f64()),
        ));
    }

    Ok(HandlerOutput::Expanded {
        verdicts,
        failed: false,
    })
}

fn sub_failure(name: &str, error: &str, started: Instant) -> Verdict {
    Verdict::failed(
        StepOutcome::new(name, Importance::Normal)
            .with_error(error)
            .with_duration(started.elapsed().as_secs_f64()),
    )
}
