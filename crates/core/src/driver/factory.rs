//! Driver factory.

use crate::config::models::RunnerConfig;
use crate::driver::base::{BrowserDriver, DriverError};
use crate::driver::adapters::MockDriver;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which driver backs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// A real browser over the DevTools protocol.
    Chromium,
    /// An empty in-memory page; every navigation succeeds.
    Mock,
}

impl DriverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverKind::Chromium => "chromium",
            DriverKind::Mock => "mock",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chromium" | "chrome" => Ok(DriverKind::Chromium),
            "mock" => Ok(DriverKind::Mock),
            other => Err(DriverError::NotAvailable(format!("unknown driver '{other}'"))),
        }
    }
}

/// Create a driver of the given kind.
///
/// # Errors
///
/// `DriverError::NotAvailable` when Chromium is requested but the crate was
/// built without the `chromium` feature, or the browser fails to launch.
pub async fn create_driver(
    kind: DriverKind,
    config: &RunnerConfig,
) -> Result<Arc<dyn BrowserDriver>, DriverError> {
    tracing::debug!(driver = %kind, "Creating driver");
    match kind {
        DriverKind::Mock => Ok(Arc::new(MockDriver::new())),
        DriverKind::Chromium => launch_chromium(config).await,
    }
}

#[cfg(feature = "chromium")]
async fn launch_chromium(config: &RunnerConfig) -> Result<Arc<dyn BrowserDriver>, DriverError> {
    let driver = crate::driver::adapters::ChromiumDriver::launch(config).await?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "chromium"))]
async fn launch_chromium(_config: &RunnerConfig) -> Result<Arc<dyn BrowserDriver>, DriverError> {
    Err(DriverError::NotAvailable(
        "built without the `chromium` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_kind_parsing() {
        assert_eq!("chromium".parse::<DriverKind>().unwrap(), DriverKind::Chromium);
        assert_eq!("Chrome".parse::<DriverKind>().unwrap(), DriverKind::Chromium);
        assert_eq!("mock".parse::<DriverKind>().unwrap(), DriverKind::Mock);
        assert!("firefox".parse::<DriverKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_mock_driver() {
        let driver = create_driver(DriverKind::Mock, &RunnerConfig::default())
            .await
            .unwrap();
        assert!(driver.navigate("https://shop.test/").await.unwrap());
    }

    #[cfg(not(feature = "chromium"))]
    #[tokio::test]
    async fn test_chromium_requires_feature() {
        let result = create_driver(DriverKind::Chromium, &RunnerConfig::default()).await;
        assert!(matches!(result, Err(DriverError::NotAvailable(_))));
    }
}
