//! # fq-protocol
//!
//! Data models shared by the flow-qa engine, runner and report consumers.
//!
//! This crate defines:
//! - Flow definitions as authored in `flows/<environment>/*.yaml`
//! - Step outcomes and the run result handed to report generators
//! - Progress events emitted during a run
//!
//! ## Modules
//!
//! - [`flow_models`]: Flows, steps, importance, action kinds, credentials
//! - [`result_models`]: Outcomes, buckets, coverage summary, run result
//! - [`events`]: Progress events for front ends
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` for report tooling
//! - Independent compilation: no dependencies on other flow-qa crates

pub mod events;
pub mod flow_models;
pub mod result_models;

// Re-export all public types for convenience
pub use events::*;
pub use flow_models::*;
pub use result_models::*;
