//! Directory structure and file generation for `flowqa init`.

use super::error::{InitError, InitResult};
use super::templates::{get_template, render_flow_template, CONFIG_TEMPLATE};
use crate::config::models::CONFIG_FILE_NAME;
use crate::flows::manager::ENVIRONMENTS;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the example flow written by `init`.
pub const EXAMPLE_FLOW: &str = "example";

/// Options for initializing a flow-qa project.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory that receives `flowqa.toml` and `flows/`.
    pub target_dir: PathBuf,

    /// Overwrite an existing `flowqa.toml` and example flow.
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
        }
    }
}

/// Generate a project skeleton.
///
/// ```text
/// flowqa.toml
/// flows/
/// ├── prod/
/// │   └── example.yaml
/// └── uat/
/// ```
///
/// # Errors
/// - `flowqa.toml` already exists and `force` is not set
/// - A template is missing from the embedded assets
/// - File system operations fail
pub async fn generate_project(options: InitOptions) -> InitResult<()> {
    let config_path = options.target_dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !options.force {
        return Err(InitError::ConfigExists(config_path));
    }

    let config = get_template(CONFIG_TEMPLATE)
        .ok_or_else(|| InitError::TemplateNotFound(CONFIG_TEMPLATE.to_string()))?;
    write_file(&config_path, &config)?;

    let flows_dir = options.target_dir.join("flows");
    for environment in ENVIRONMENTS {
        create_dir(&flows_dir.join(environment))?;
    }
    create_dir(&options.target_dir.join("screenshots"))?;

    let example = render_flow_template(EXAMPLE_FLOW)
        .ok_or_else(|| InitError::TemplateNotFound(super::templates::FLOW_TEMPLATE.to_string()))?;
    write_file(
        &flows_dir.join(ENVIRONMENTS[0]).join(format!("{EXAMPLE_FLOW}.yaml")),
        &example,
    )?;

    tracing::info!(dir = %options.target_dir.display(), "Initialized flow-qa project");
    Ok(())
}

fn create_dir(path: &Path) -> InitResult<()> {
    fs::create_dir_all(path).map_err(|source| InitError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> InitResult<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }

    fs::write(path, content).map_err(|source| InitError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generate_project_success() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
        };

        let result = generate_project(options).await;
        assert!(result.is_ok(), "Failed: {:?}", result.err());

        let root = dir.path();
        assert!(root.join("flowqa.toml").exists());
        assert!(root.join("flows/prod").is_dir());
        assert!(root.join("flows/uat").is_dir());
        assert!(root.join("screenshots").is_dir());

        let example = fs::read_to_string(root.join("flows/prod/example.yaml")).unwrap();
        assert!(example.contains("name: \"example\""));
    }

    #[tokio::test]
    async fn test_generate_project_refuses_existing_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flowqa.toml"), "headless = false").unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
        };

        let result = generate_project(options).await;
        assert!(matches!(result, Err(InitError::ConfigExists(_))));

        let kept = fs::read_to_string(dir.path().join("flowqa.toml")).unwrap();
        assert_eq!(kept, "headless = false");
    }

    #[tokio::test]
    async fn test_generate_project_force_overwrites() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flowqa.toml"), "headless = false").unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: true,
        };

        generate_project(options).await.unwrap();

        let config = fs::read_to_string(dir.path().join("flowqa.toml")).unwrap();
        assert!(config.contains("retry_attempts"));
    }
}
