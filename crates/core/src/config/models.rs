//! Runner configuration read from `flowqa.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "flowqa.toml";

/// Per-call driver timeouts in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    /// Page navigation.
    pub navigation_ms: u64,
    /// Element lookups (click, visibility, text).
    pub element_ms: u64,
    /// Settling after a click that triggers navigation.
    pub post_click_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            element_ms: 10_000,
            post_click_ms: 15_000,
        }
    }
}

/// Browser viewport restored after responsive checks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Unified runner configuration.
///
/// Every key is optional; a missing `flowqa.toml` yields the defaults.
///
/// # Example
///
/// ```toml
/// flows_dir = "flows"
/// screenshots_dir = "screenshots"
/// headless = true
/// retry_attempts = 2
///
/// [timeouts]
/// navigation_ms = 30000
/// element_ms = 10000
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root of the `<environment>/<flow>.yaml` tree.
    pub flows_dir: PathBuf,

    /// Where failure screenshots and `screenshot` steps are written.
    pub screenshots_dir: PathBuf,

    /// Launch the browser without a window.
    pub headless: bool,

    /// Attempts for actions with retry semantics.
    pub retry_attempts: u32,

    pub timeouts: Timeouts,

    pub viewport: Viewport,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            flows_dir: PathBuf::from("flows"),
            screenshots_dir: PathBuf::from("screenshots"),
            headless: true,
            retry_attempts: 2,
            timeouts: Timeouts::default(),
            viewport: Viewport::default(),
        }
    }
}
