//! Flow definition storage.
//!
//! Flows live under `<flows_dir>/<environment>/<name>.yaml` (JSON is also
//! accepted on load). The [`FlowManager`] resolves, loads, saves, lists and
//! copies them.

pub mod error;
pub mod manager;

pub use error::{FlowError, FlowResult};
pub use manager::{FlowManager, DEFAULT_ENVIRONMENT, ENVIRONMENTS};
