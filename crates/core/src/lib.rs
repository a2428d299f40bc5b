//! # fq-core
//!
//! Flow execution engine for flow-qa.
//!
//! This crate provides:
//! - Configuration loading from `flowqa.toml`
//! - Flow storage per environment (YAML or JSON)
//! - The browser driver abstraction with Chromium and mock adapters
//! - The flow interpreter with retries, diagnostics and blocking-skip rules
//! - Project scaffolding for `flowqa init`
//!
//! ## Modules
//!
//! - [`config`]: Runner configuration loading
//! - [`driver`]: `BrowserDriver` trait and adapters
//! - [`engine`]: Flow execution engine
//! - [`flows`]: Flow file management
//! - [`init`]: Project scaffolding

pub mod config;
pub mod driver;
pub mod engine;
pub mod flows;
pub mod init;
