//! Runner configuration loading.
//!
//! This module loads `flowqa.toml` from the project root and resolves the
//! directories it names.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{RunnerConfig, Timeouts, Viewport, CONFIG_FILE_NAME};
