//! Loader for the `flowqa.toml` runner configuration.
//!
//! Relative directories in the file are resolved against the project root
//! so the runner behaves the same regardless of the working directory.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::RunnerConfig;
use crate::config::models::CONFIG_FILE_NAME;
use std::path::Path;
use std::path::PathBuf;

/// Loads the runner configuration from `<root>/flowqa.toml`.
///
/// # Returns
///
/// The parsed configuration with `flows_dir` and `screenshots_dir` made
/// absolute relative to `root`. A missing file yields the defaults rather
/// than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file has invalid TOML syntax or wrongly typed keys
/// - `retry_attempts` is zero
///
/// # Example
///
/// ```rust,no_run
/// use fq_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Flows live in {}", config.flows_dir.display());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<RunnerConfig> {
    let config_path = root.join(CONFIG_FILE_NAME);

    let mut config = if config_path.exists() {
        load_config_file(&config_path)?
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        RunnerConfig::default()
    };

    config.flows_dir = resolve(root, &config.flows_dir);
    config.screenshots_dir = resolve(root, &config.screenshots_dir);

    Ok(config)
}

/// Parses a single configuration file without resolving its paths.
pub fn load_config_file(config_path: &Path) -> ConfigResult<RunnerConfig> {
    let content =
        std::fs::read_to_string(config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.to_path_buf(),
            source,
        })?;

    let config: RunnerConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.to_path_buf(),
            source,
        })?;

    if config.retry_attempts == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path.to_path_buf(),
            reason: "retry_attempts must be at least 1".to_string(),
        });
    }

    Ok(config)
}

fn resolve(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_config_full_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        let config_toml = r#"
flows_dir = "qa/flows"
screenshots_dir = "/tmp/shots"
headless = false
retry_attempts = 3

[timeouts]
navigation_ms = 45000
element_ms = 5000
post_click_ms = 20000

[viewport]
width = 1280
height = 800
"#;
        fs::write(root.join("flowqa.toml"), config_toml).expect("Failed to write flowqa.toml");

        let config = load_config(root).await.expect("Failed to load config");

        assert_eq!(config.flows_dir, root.join("qa/flows"));
        assert_eq!(config.screenshots_dir, PathBuf::from("/tmp/shots"));
        assert!(!config.headless);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.timeouts.navigation_ms, 45_000);
        assert_eq!(config.timeouts.element_ms, 5_000);
        assert_eq!(config.timeouts.post_click_ms, 20_000);
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 800);
    }

    #[tokio::test]
    async fn test_load_config_missing_file_uses_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        let config = load_config(root)
            .await
            .expect("Should handle missing flowqa.toml");

        assert_eq!(config.flows_dir, root.join("flows"));
        assert_eq!(config.screenshots_dir, root.join("screenshots"));
        assert!(config.headless);
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.timeouts.element_ms, 10_000);
        assert_eq!(config.viewport.width, 1920);
    }

    #[tokio::test]
    async fn test_load_config_partial_keeps_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        fs::write(
            root.join("flowqa.toml"),
            "headless = false\n[timeouts]\nelement_ms = 2500\n",
        )
        .expect("Failed to write flowqa.toml");

        let config = load_config(root).await.expect("Should handle partial config");

        assert!(!config.headless);
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.timeouts.element_ms, 2_500);
        assert_eq!(config.timeouts.navigation_ms, 30_000);
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        fs::write(root.join("flowqa.toml"), "headless = [invalid toml")
            .expect("Failed to write flowqa.toml");

        let result = load_config(root).await;

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("flowqa.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_retries() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        fs::write(root.join("flowqa.toml"), "retry_attempts = 0")
            .expect("Failed to write flowqa.toml");

        let result = load_config(root).await;

        match result {
            Err(ConfigError::InvalidConfig { reason, .. }) => {
                assert!(reason.contains("retry_attempts"));
            }
            other => panic!("Expected InvalidConfig error, got {:?}", other),
        }
    }
}
