//! Element expectations: check_element and assert_text.
//!
//! A mismatch means the element was reachable, so it fails without
//! screenshot capture. Only an unreachable element gets diagnostics.

use crate::driver::base::DriverError;
use crate::engine::context::{StepContext, Verdict};
use crate::engine::diagnostics;
use crate::engine::handlers::MISSING_SELECTOR;
use crate::engine::retry::{with_retries, Enrichment};

pub const MISSING_ASSERT_PARAMS: &str = "Missing selector or text for assert_text";

pub(super) async fn check_element(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let Some(selector) = ctx.selector() else {
        return Ok(ctx.fail(MISSING_SELECTOR));
    };
    let expect_visible = ctx.step.visible.unwrap_or(true);
    // Waiting only makes sense for an element expected to appear.
    let timeout_ms = if expect_visible {
        ctx.settings.timeouts.element_ms
    } else {
        0
    };
    let enrichment = Enrichment::Diagnostics {
        selector,
        expected_text: None,
    };

    Ok(with_retries(ctx, "Element check", enrichment, || async move {
        let visible = ctx.driver.is_visible(selector, timeout_ms).await?;
        if visible == expect_visible {
            Ok(ctx.pass())
        } else if expect_visible {
            Ok(ctx.fail("Element should be visible"))
        } else {
            Ok(ctx.fail("Element should be invisible"))
        }
    })
    .await)
}

pub(super) async fn assert_text(ctx: &StepContext<'_>) -> Result<Verdict, DriverError> {
    let text = ctx.step.text.as_deref().filter(|t| !t.is_empty());
    let (Some(selector), Some(text)) = (ctx.selector(), text) else {
        return Ok(ctx.fail(MISSING_ASSERT_PARAMS));
    };
    let should_exist = ctx.step.should_exist.unwrap_or(true);

    match ctx.driver.inner_text(selector).await {
        Ok(actual) => {
            let found = actual.contains(text);
            Ok(match (found, should_exist) {
                (true, true) | (false, false) => ctx.pass(),
                (false, true) => ctx.fail(format!("Text '{text}' not found in {selector}")),
                (true, false) => ctx.fail(format!("Text '{text}' should not appear in {selector}")),
            })
        }
        Err(err) => {
            tracing::warn!(step = ctx.name, selector, error = %err, "Text assertion target unreachable");
            let diagnostics = diagnostics::capture(ctx, selector, Some(text)).await;
            let error = format!(
                "Selector '{selector}' not found. XPath suggestion: {}",
                diagnostics.xpath
            );
            Ok(Verdict::failed(diagnostics.apply(ctx.outcome().with_error(error))))
        }
    }
}
