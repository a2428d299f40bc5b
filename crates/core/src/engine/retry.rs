//! Bounded retries around driver operations.
//!
//! Every handler with retry semantics goes through [`with_retries`]: the
//! operation is attempted up to `retry_attempts` times, and when the last
//! attempt still errors the failure message names the label and the
//! attempt number. Element-level actions also attach diagnostics.

use crate::driver::base::DriverError;
use crate::engine::context::{StepContext, Verdict};
use crate::engine::diagnostics;
use std::future::Future;

/// Extra artifacts to capture when retries are exhausted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Enrichment<'s> {
    None,
    Diagnostics {
        selector: &'s str,
        expected_text: Option<&'s str>,
    },
}

/// Run `operation` until it returns `Ok` or the attempts run out.
///
/// An `Ok` verdict, passing or failing, is returned as is. After the last
/// error the verdict is a failure reading `"<label> error (attempt N): <cause>"`.
pub(crate) async fn with_retries<F, Fut>(
    ctx: &StepContext<'_>,
    label: &str,
    enrichment: Enrichment<'_>,
    operation: F,
) -> Verdict
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Verdict, DriverError>>,
{
    with_attempts(ctx, ctx.settings.retry_attempts, label, enrichment, operation).await
}

/// Single-attempt variant for actions without retry semantics.
pub(crate) async fn once<F, Fut>(ctx: &StepContext<'_>, label: &str, operation: F) -> Verdict
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Verdict, DriverError>>,
{
    with_attempts(ctx, 1, label, Enrichment::None, operation).await
}

async fn with_attempts<F, Fut>(
    ctx: &StepContext<'_>,
    attempts: u32,
    label: &str,
    enrichment: Enrichment<'_>,
    mut operation: F,
) -> Verdict
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Verdict, DriverError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(verdict) => return verdict,
            Err(err) if attempt < attempts => {
                tracing::debug!(step = ctx.name, attempt, error = %err, "{label} failed, retrying");
            }
            Err(err) => {
                tracing::warn!(step = ctx.name, attempt, error = %err, "{label} failed");
                let message = if attempts > 1 {
                    format!("{label} error (attempt {attempt}): {err}")
                } else {
                    format!("{label} error: {err}")
                };
                return exhausted(ctx, message, enrichment).await;
            }
        }
    }
}

/// The XPath suggestion is repeated in the error text for consumers that
/// only show `error`.
async fn exhausted(ctx: &StepContext<'_>, message: String, enrichment: Enrichment<'_>) -> Verdict {
    match enrichment {
        Enrichment::None => Verdict::failed(ctx.outcome().with_error(message)),
        Enrichment::Diagnostics {
            selector,
            expected_text,
        } => {
            let diagnostics = diagnostics::capture(ctx, selector, expected_text).await;
            let error = format!("{message}. XPath suggestion: {}", diagnostics.xpath);
            Verdict::failed(diagnostics.apply(ctx.outcome().with_error(error)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::adapters::MockDriver;
    use crate::engine::context::EngineSettings;
    use fq_protocol::flow_models::{FlowDefinition, Importance, Step};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fixture() -> (MockDriver, FlowDefinition, Step, EngineSettings) {
        let flow = FlowDefinition::new("retry", "https://shop.test");
        let step = Step::new("Open cart", "click").with_selector(".cart");
        let settings = EngineSettings {
            screenshots_dir: std::env::temp_dir().join("fq-retry-tests"),
            ..EngineSettings::default()
        };
        (MockDriver::new(), flow, step, settings)
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (driver, flow, step, settings) = fixture();
        let ctx = StepContext {
            driver: &driver,
            flow: &flow,
            step: &step,
            name: "Open cart",
            importance: Importance::Normal,
            credentials: None,
            settings: &settings,
        };
        let ctx = &ctx;
        let calls = &AtomicU32::new(0);

        let verdict = with_retries(ctx, "Click", Enrichment::None, || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DriverError::Other("flaky".to_string()))
            } else {
                Ok(ctx.pass())
            }
        })
        .await;

        assert!(!verdict.is_failure());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_message_names_attempt() {
        let (driver, flow, step, settings) = fixture();
        let ctx = StepContext {
            driver: &driver,
            flow: &flow,
            step: &step,
            name: "Open cart",
            importance: Importance::Blocking,
            credentials: None,
            settings: &settings,
        };

        let verdict = with_retries(&ctx, "Click", Enrichment::None, || async move {
            Err::<Verdict, _>(DriverError::ElementNotFound(".cart".to_string()))
        })
        .await;

        assert!(verdict.is_failure());
        assert_eq!(
            verdict.outcome.error.as_deref(),
            Some("Click error (attempt 2): Element not found: .cart")
        );
        assert_eq!(verdict.outcome.importance, Importance::Blocking);
        assert!(verdict.outcome.screenshot.is_none());
    }

    #[tokio::test]
    async fn test_exhausted_diagnostics_extend_error() {
        let (driver, flow, step, settings) = fixture();
        let ctx = StepContext {
            driver: &driver,
            flow: &flow,
            step: &step,
            name: "Open cart",
            importance: Importance::Normal,
            credentials: None,
            settings: &settings,
        };
        let enrichment = Enrichment::Diagnostics {
            selector: ".cart",
            expected_text: None,
        };

        let verdict = with_retries(&ctx, "Click", enrichment, || async move {
            Err::<Verdict, _>(DriverError::ElementNotFound(".cart".to_string()))
        })
        .await;

        assert_eq!(
            verdict.outcome.error.as_deref(),
            Some(
                "Click error (attempt 2): Element not found: .cart. \
                 XPath suggestion: //*[contains(@class, 'cart')]"
            )
        );
        assert_eq!(
            verdict.outcome.xpath_suggestion.as_deref(),
            Some("//*[contains(@class, 'cart')]")
        );
    }

    #[tokio::test]
    async fn test_once_does_not_retry() {
        let (driver, flow, step, settings) = fixture();
        let ctx = StepContext {
            driver: &driver,
            flow: &flow,
            step: &step,
            name: "Shot",
            importance: Importance::Normal,
            credentials: None,
            settings: &settings,
        };
        let calls = &AtomicU32::new(0);

        let verdict = once(&ctx, "Screenshot", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Verdict, _>(DriverError::Other("disk full".to_string()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            verdict.outcome.error.as_deref(),
            Some("Screenshot error: Driver error: disk full")
        );
    }
}
