//! Subcommand implementations.

pub mod flows;
pub mod init;
pub mod run;
