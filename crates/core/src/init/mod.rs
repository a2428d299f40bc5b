//! Project scaffolding for `flowqa init`.
//!
//! Generates a `flowqa.toml` and the `flows/<environment>/` tree with an
//! example flow rendered from the embedded templates.
//!
//! # Example
//!
//! ```no_run
//! use fq_core::init::{generate_project, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//! };
//!
//! generate_project(options).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_project, InitOptions};
pub use templates::{get_template, render_flow_template};
