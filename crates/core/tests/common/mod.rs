//! Common test utilities for the engine and flow manager integration tests.
//!
//! This module provides:
//! - Test fixtures (temporary projects, engines wired to a mock driver)
//! - Custom assertions over run results and events

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
