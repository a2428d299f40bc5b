//! Concrete [`BrowserDriver`](crate::driver::BrowserDriver) implementations.

#[cfg(feature = "chromium")]
pub mod chromium_driver;
pub mod mock_driver;

#[cfg(feature = "chromium")]
pub use chromium_driver::ChromiumDriver;
pub use mock_driver::{MockDriver, MockOp};
