//! Browser automation layer.
//!
//! The engine depends only on the [`BrowserDriver`] trait. Adapters:
//! - [`MockDriver`]: scriptable in-memory page for tests and dry runs
//! - `ChromiumDriver`: DevTools-protocol browser (`chromium` feature)

pub mod adapters;
pub mod base;
pub mod factory;

pub use adapters::{MockDriver, MockOp};
pub use base::{BrowserDriver, DriverError};
pub use factory::{create_driver, DriverKind};
