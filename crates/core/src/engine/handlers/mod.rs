//! Action handlers, one per [`ActionKind`].
//!
//! Dispatch is a static `match`: adding a variant to `ActionKind` without a
//! handler does not compile. Handlers return a verdict for the step; a
//! `DriverError` escaping a handler is turned into a failure by the
//! interpreter.

mod assertions;
pub(crate) mod audits;
mod crawl;
mod navigation;

use crate::driver::base::{BrowserDriver, DriverError};
use crate::engine::context::{HandlerOutput, StepContext};
use fq_protocol::flow_models::ActionKind;
use serde::de::DeserializeOwned;

pub use assertions::MISSING_ASSERT_PARAMS;
pub use audits::DEVICES;
pub use crawl::{DEFAULT_MAX_PAGES, NO_LINKS_FOUND};
pub use navigation::{resolve_url, SESSION_LOST};

/// Failure text when a selector-driven step has no selector.
pub const MISSING_SELECTOR: &str = "Missing selector or page not available";

pub const NAVIGATION_FAILED: &str = "Navigation failed";

pub(crate) async fn dispatch(
    kind: ActionKind,
    ctx: &StepContext<'_>,
) -> Result<HandlerOutput, DriverError> {
    let verdict = match kind {
        ActionKind::Navigate => navigation::navigate(ctx).await,
        ActionKind::Click => navigation::click(ctx).await,
        ActionKind::FillForm => navigation::fill_form(ctx).await,
        ActionKind::Wait => navigation::wait(ctx).await,
        ActionKind::Screenshot => navigation::screenshot(ctx).await,
        ActionKind::CheckElement => assertions::check_element(ctx).await,
        ActionKind::AssertText => assertions::assert_text(ctx).await,
        ActionKind::CheckUi => audits::check_ui(ctx).await,
        ActionKind::TestResponsive => audits::test_responsive(ctx).await,
        ActionKind::CheckLinks => audits::check_links(ctx).await,
        ActionKind::CheckAccessibility => audits::check_accessibility(ctx).await,
        ActionKind::CheckPerformance => audits::check_performance(ctx).await,
        ActionKind::AutoCrawl => return crawl::auto_crawl(ctx).await,
    };
    verdict.map(HandlerOutput::Single)
}

/// Evaluate a script and deserialize its result. `null` reads as `{}`.
pub(crate) async fn evaluate_as<T: DeserializeOwned>(
    driver: &dyn BrowserDriver,
    script: &str,
) -> Result<T, DriverError> {
    let value = match driver.evaluate(script).await? {
        serde_json::Value::Null => serde_json::json!({}),
        value => value,
    };
    serde_json::from_value(value).map_err(|err| DriverError::Script(err.to_string()))
}
