//! Loading and saving flow definitions on disk.

use crate::flows::error::{FlowError, FlowResult};
use crate::init::templates::{render_flow_template, FLOW_TEMPLATE};
use chrono::Utc;
use fq_protocol::flow_models::{FlowDefinition, FlowMetadata};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Environments created alongside the flows directory.
pub const ENVIRONMENTS: [&str; 2] = ["prod", "uat"];

pub const DEFAULT_ENVIRONMENT: &str = "prod";

/// Load order when resolving a flow by name.
const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Resolves flow names to files under `<flows_dir>/<environment>/`.
#[derive(Debug, Clone)]
pub struct FlowManager {
    flows_dir: PathBuf,
}

impl FlowManager {
    /// Open a flows directory, creating it and the standard environment
    /// subdirectories when missing.
    pub fn new(flows_dir: impl Into<PathBuf>) -> FlowResult<Self> {
        let flows_dir = flows_dir.into();
        for environment in ENVIRONMENTS {
            create_dir(&flows_dir.join(environment))?;
        }
        Ok(Self { flows_dir })
    }

    pub fn flows_dir(&self) -> &Path {
        &self.flows_dir
    }

    /// Path a flow is written to by [`save_flow`](Self::save_flow).
    pub fn flow_path(&self, name: &str, environment: &str) -> FlowResult<PathBuf> {
        validate_name(name)?;
        validate_name(environment)?;
        Ok(self.flows_dir.join(environment).join(format!("{name}.yaml")))
    }

    /// Load a flow, trying `.yaml`, then `.yml`, then `.json`.
    pub fn load_flow(&self, name: &str, environment: &str) -> FlowResult<FlowDefinition> {
        validate_name(name)?;
        validate_name(environment)?;
        let env_dir = self.flows_dir.join(environment);

        for extension in EXTENSIONS {
            let path = env_dir.join(format!("{name}.{extension}"));
            if !path.is_file() {
                continue;
            }

            tracing::debug!(path = %path.display(), "Loading flow");
            let content = fs::read_to_string(&path).map_err(|source| FlowError::FileRead {
                path: path.clone(),
                source,
            })?;

            let flow = if extension == "json" {
                serde_json::from_str(&content)
                    .map_err(|source| FlowError::JsonParse { path, source })?
            } else {
                serde_yaml::from_str(&content)
                    .map_err(|source| FlowError::YamlParse { path, source })?
            };
            return Ok(flow);
        }

        Err(FlowError::NotFound {
            name: name.to_string(),
            environment: environment.to_string(),
        })
    }

    /// Write a flow as YAML, stamping its metadata with the save time and
    /// environment. Returns the written path.
    pub fn save_flow(
        &self,
        name: &str,
        flow: &FlowDefinition,
        environment: &str,
    ) -> FlowResult<PathBuf> {
        let path = self.flow_path(name, environment)?;
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        let mut stamped = flow.clone();
        stamped.metadata = Some(FlowMetadata {
            last_updated: Utc::now().to_rfc3339(),
            environment: environment.to_string(),
        });

        let content = serde_yaml::to_string(&stamped).map_err(|source| FlowError::Serialize {
            name: name.to_string(),
            source,
        })?;
        write_file(&path, &content)?;

        tracing::info!(flow = name, environment, path = %path.display(), "Saved flow");
        Ok(path)
    }

    /// List flow names per environment, sorted. With `Some(env)` only that
    /// environment is listed (and is present even when empty).
    pub fn list_flows(&self, environment: Option<&str>) -> FlowResult<BTreeMap<String, Vec<String>>> {
        let environments: Vec<String> = match environment {
            Some(env) => {
                validate_name(env)?;
                vec![env.to_string()]
            }
            None => self.environments()?,
        };

        let mut listing = BTreeMap::new();
        for env in environments {
            let env_dir = self.flows_dir.join(&env);
            let mut names = Vec::new();

            if env_dir.is_dir() {
                for entry in WalkDir::new(&env_dir).min_depth(1).max_depth(1) {
                    let entry = entry.map_err(|source| FlowError::DirectoryWalk {
                        path: env_dir.clone(),
                        source,
                    })?;
                    let path = entry.path();
                    let is_flow = path
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|ext| EXTENSIONS.contains(&ext));
                    if !entry.file_type().is_file() || !is_flow {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }

            names.sort();
            names.dedup();
            listing.insert(env, names);
        }

        Ok(listing)
    }

    /// Copy a flow from one environment to another, re-stamping metadata.
    pub fn copy_flow(&self, name: &str, from: &str, to: &str) -> FlowResult<PathBuf> {
        let flow = self.load_flow(name, from)?;
        self.save_flow(name, &flow, to)
    }

    /// Create a new flow from the embedded starter template.
    pub fn create_template_flow(&self, name: &str, environment: &str) -> FlowResult<PathBuf> {
        let content = render_flow_template(name)
            .ok_or_else(|| FlowError::TemplateNotFound(FLOW_TEMPLATE.to_string()))?;

        let path = self.flow_path(name, environment)?;
        let flow: FlowDefinition =
            serde_yaml::from_str(&content).map_err(|source| FlowError::YamlParse {
                path: path.clone(),
                source,
            })?;

        self.save_flow(name, &flow, environment)
    }

    fn environments(&self) -> FlowResult<Vec<String>> {
        let mut environments = Vec::new();
        for entry in WalkDir::new(&self.flows_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| FlowError::DirectoryWalk {
                path: self.flows_dir.clone(),
                source,
            })?;
            if entry.file_type().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    environments.push(name.to_string());
                }
            }
        }
        environments.sort();
        Ok(environments)
    }
}

fn validate_name(name: &str) -> FlowResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(FlowError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn create_dir(path: &Path) -> FlowResult<()> {
    fs::create_dir_all(path).map_err(|source| FlowError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> FlowResult<()> {
    fs::write(path, content).map_err(|source| FlowError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fq_protocol::flow_models::Step;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_environment_dirs() {
        let dir = tempdir().unwrap();
        let manager = FlowManager::new(dir.path().join("flows")).unwrap();

        assert!(manager.flows_dir().join("prod").is_dir());
        assert!(manager.flows_dir().join("uat").is_dir());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let manager = FlowManager::new(dir.path()).unwrap();

        for name in ["", "..", "../secrets", "a/b", "a\\b"] {
            let result = manager.load_flow(name, "prod");
            assert!(
                matches!(result, Err(FlowError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_save_stamps_metadata() {
        let dir = tempdir().unwrap();
        let manager = FlowManager::new(dir.path()).unwrap();
        let flow = FlowDefinition::new("smoke", "https://shop.test")
            .with_step(Step::new("Home", "navigate").with_url("/"));

        let path = manager.save_flow("smoke", &flow, "uat").unwrap();
        assert!(path.ends_with("uat/smoke.yaml"));

        let loaded = manager.load_flow("smoke", "uat").unwrap();
        let metadata = loaded.metadata.expect("metadata should be stamped");
        assert_eq!(metadata.environment, "uat");
        assert_eq!(loaded.steps, flow.steps);
    }

    #[test]
    fn test_yaml_wins_over_json() {
        let dir = tempdir().unwrap();
        let manager = FlowManager::new(dir.path()).unwrap();
        fs::write(
            dir.path().join("prod/dup.yaml"),
            "name: from-yaml\nbase_url: https://a.test\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("prod/dup.json"),
            r#"{"name": "from-json", "base_url": "https://b.test"}"#,
        )
        .unwrap();

        let flow = manager.load_flow("dup", "prod").unwrap();
        assert_eq!(flow.name, "from-yaml");
    }
}
