//! Failure diagnostics: screenshot, HTML snippet and XPath suggestion.

use crate::engine::context::StepContext;
use chrono::{DateTime, Utc};
use fq_protocol::result_models::StepOutcome;
use std::path::{Path, PathBuf};

/// Artifacts captured when an element-level action fails.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    pub screenshot: Option<PathBuf>,
    pub html: Option<String>,
    pub xpath: String,
}

impl Diagnostics {
    /// Attach the captured artifacts to a failure outcome.
    pub fn apply(self, mut outcome: StepOutcome) -> StepOutcome {
        if let Some(path) = self.screenshot {
            outcome = outcome.with_screenshot(path.display().to_string());
        }
        if let Some(html) = self.html {
            outcome = outcome.with_html_snippet(&html);
        }
        outcome.with_xpath_suggestion(self.xpath)
    }
}

/// Capture diagnostics for a failed step. Each artifact is best effort: a
/// capture error is logged and that artifact left out.
pub(crate) async fn capture(
    ctx: &StepContext<'_>,
    selector: &str,
    expected_text: Option<&str>,
) -> Diagnostics {
    let html = match ctx.driver.content().await {
        Ok(html) => Some(html),
        Err(err) => {
            tracing::warn!(step = ctx.name, error = %err, "Could not read page content");
            None
        }
    };

    let path = screenshot_path(&ctx.settings.screenshots_dir, ctx.name, Utc::now());
    let screenshot = match save_screenshot(ctx, &path).await {
        Ok(()) => Some(path),
        Err(err) => {
            tracing::warn!(step = ctx.name, error = %err, "Could not capture failure screenshot");
            None
        }
    };

    Diagnostics {
        screenshot,
        html,
        xpath: xpath_suggestion(selector, expected_text),
    }
}

/// Create the parent directory and ask the driver for a screenshot.
pub(crate) async fn save_screenshot(
    ctx: &StepContext<'_>,
    path: &Path,
) -> Result<(), crate::driver::DriverError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| crate::driver::DriverError::Artifact {
                path: parent.display().to_string(),
                reason: err.to_string(),
            })?;
    }
    ctx.driver.screenshot(path).await
}

/// `<dir>/<sanitized step name>_<unix seconds>.png`
pub fn screenshot_path(dir: &Path, step_name: &str, at: DateTime<Utc>) -> PathBuf {
    dir.join(format!("{}_{}.png", sanitize_file_stem(step_name), at.timestamp()))
}

/// Replace anything outside `[A-Za-z0-9_-]` so a step name is a safe file stem.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "step".to_string()
    } else {
        stem
    }
}

/// Class-like token of a selector: its first `.class` part, or the whole
/// selector with dots trimmed.
pub fn class_token(selector: &str) -> String {
    let token = selector
        .split('.')
        .nth(1)
        .map(|rest| {
            rest.split(|c: char| c.is_whitespace() || matches!(c, '#' | '[' | ':' | '>' | ',' | '.'))
                .next()
                .unwrap_or(rest)
        })
        .filter(|token| !token.is_empty());

    match token {
        Some(token) => token.to_string(),
        None => selector.trim_matches('.').to_string(),
    }
}

/// XPath locating elements by class token, and by text when one is expected.
pub fn xpath_suggestion(selector: &str, expected_text: Option<&str>) -> String {
    let token = class_token(selector);
    match expected_text {
        Some(text) => format!("//*[contains(text(), '{text}') or contains(@class, '{token}')]"),
        None => format!("//*[contains(@class, '{token}')]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_class_token() {
        assert_eq!(class_token(".cart-total"), "cart-total");
        assert_eq!(class_token("div.price.large"), "price");
        assert_eq!(class_token("#main .btn-primary > span"), "btn-primary");
        assert_eq!(class_token("button"), "button");
        assert_eq!(class_token(".."), "");
    }

    #[test]
    fn test_xpath_suggestion() {
        assert_eq!(
            xpath_suggestion(".cart-icon", None),
            "//*[contains(@class, 'cart-icon')]"
        );
        assert_eq!(
            xpath_suggestion(".cart-total", Some("Total")),
            "//*[contains(text(), 'Total') or contains(@class, 'cart-total')]"
        );
    }

    #[test]
    fn test_screenshot_path_is_deterministic() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let path = screenshot_path(Path::new("shots"), "Open cart / mini", at);

        assert_eq!(
            path,
            PathBuf::from(format!("shots/Open_cart___mini_{}.png", at.timestamp()))
        );
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize_file_stem(""), "step");
    }
}
