//! Test fixtures for creating sample projects, flows and engines.

use fq_core::driver::{BrowserDriver, MockDriver};
use fq_core::engine::{EngineSettings, FlowEngine};
use fq_core::flows::FlowManager;
use fq_protocol::events::RunEvent;
use fq_protocol::flow_models::{FlowDefinition, Importance, Step};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

#[allow(dead_code)]
pub const BASE_URL: &str = "https://shop.test";

/// A sample flow in YAML, as a user would author it.
#[allow(dead_code)]
pub const CHECKOUT_YAML: &str = r#"
name: checkout
description: Smoke test for the checkout path
base_url: https://shop.test
steps:
  - name: Open home page
    action: navigate
    url: /
    importance: blocking
  - name: Open cart
    action: click
    selector: "@cart"
  - name: Cart total is shown
    action: assert_text
    selector: .cart-total
    text: Total
selectors:
  cart: ".cart-icon"
"#;

/// Create a temporary project with `flows/prod` and `flows/uat`.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    std::fs::create_dir_all(temp_dir.path().join("flows/prod"))?;
    std::fs::create_dir_all(temp_dir.path().join("flows/uat"))?;
    Ok(temp_dir)
}

/// Write a flow file under `flows/<environment>/<file_name>`.
#[allow(dead_code)]
pub fn write_flow(root: &Path, environment: &str, file_name: &str, content: &str) {
    let dir = root.join("flows").join(environment);
    std::fs::create_dir_all(&dir).expect("Failed to create environment dir");
    std::fs::write(dir.join(file_name), content).expect("Failed to write flow file");
}

#[allow(dead_code)]
/// Engine settings with fast, deterministic values rooted in `root`.
pub fn test_settings(root: &Path) -> EngineSettings {
    EngineSettings {
        screenshots_dir: root.join("screenshots"),
        ..EngineSettings::default()
    }
}

#[allow(dead_code)]
/// An engine over `driver` with its flows stored under `<root>/flows`.
pub fn create_engine(driver: Arc<MockDriver>, root: &Path) -> FlowEngine {
    let flows = FlowManager::new(root.join("flows")).expect("Failed to create flow manager");
    let driver: Arc<dyn BrowserDriver> = driver;
    FlowEngine::new(driver, flows, test_settings(root))
}

/// Like [`create_engine`] but with an event channel attached.
#[allow(dead_code)]
pub fn create_engine_with_events(
    driver: Arc<MockDriver>,
    root: &Path,
) -> (FlowEngine, mpsc::Receiver<RunEvent>) {
    let (tx, rx) = mpsc::channel(256);
    (create_engine(driver, root).with_events(tx), rx)
}

#[allow(dead_code)]
/// A flow over [`BASE_URL`] with the given steps.
pub fn flow_with_steps(name: &str, steps: Vec<Step>) -> FlowDefinition {
    steps
        .into_iter()
        .fold(FlowDefinition::new(name, BASE_URL), FlowDefinition::with_step)
}

#[allow(dead_code)]
pub fn navigate(name: &str, url: &str) -> Step {
    Step::new(name, "navigate").with_url(url)
}

#[allow(dead_code)]
pub fn click(name: &str, selector: &str) -> Step {
    Step::new(name, "click").with_selector(selector)
}

#[allow(dead_code)]
pub fn check_element(name: &str, selector: &str) -> Step {
    Step::new(name, "check_element").with_selector(selector)
}

#[allow(dead_code)]
pub fn assert_text(name: &str, selector: &str, text: &str) -> Step {
    Step::new(name, "assert_text")
        .with_selector(selector)
        .with_text(text)
}

#[allow(dead_code)]
pub fn blocking(step: Step) -> Step {
    step.with_importance(Importance::Blocking)
}

#[allow(dead_code)]
pub fn critical(step: Step) -> Step {
    step.with_importance(Importance::Critical)
}

/// Drain every event currently buffered on `rx`.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
