//! Error types for flow storage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, reading or writing flow files.
#[derive(Error, Debug)]
pub enum FlowError {
    /// No `.yaml`, `.yml` or `.json` file exists for the flow.
    #[error("Flow '{name}' not found in environment '{environment}'")]
    NotFound { name: String, environment: String },

    /// The flow name would escape its environment directory.
    #[error("Invalid flow name '{0}'")]
    InvalidName(String),

    #[error("Failed to read flow file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write flow file at {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to walk directory at {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Failed to parse YAML flow at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON flow at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize flow '{name}': {source}")]
    Serialize {
        name: String,
        source: serde_yaml::Error,
    },

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),
}

/// Type alias for Result with FlowError.
pub type FlowResult<T> = Result<T, FlowError>;
