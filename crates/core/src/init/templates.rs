//! Embedded templates for project scaffolding and new flows.
//!
//! `rust-embed` bakes the crate's `templates/` directory into the binary so
//! `flowqa init` and `flowqa new` work without any files on disk. With the
//! `debug-embed` feature the files are still embedded in debug builds.

use rust_embed::RustEmbed;

/// Template path of the starter flow.
pub const FLOW_TEMPLATE: &str = "flows/template.yaml";

/// Template path of the runner configuration.
pub const CONFIG_TEMPLATE: &str = "flowqa.toml";

const FLOW_NAME_PLACEHOLDER: &str = "{{flow_name}}";

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/templates"]
pub struct TemplateAssets;

/// Get template file content by path relative to `templates/`.
///
/// # Example
/// ```
/// use fq_core::init::templates::get_template;
///
/// let config = get_template("flowqa.toml").expect("flowqa.toml should exist");
/// assert!(config.contains("retry_attempts"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// Render the starter flow with the given name.
///
/// Only the flow name placeholder is substituted; credential placeholders
/// such as `{{username}}` are left for the `fill_form` step to resolve.
pub fn render_flow_template(flow_name: &str) -> Option<String> {
    get_template(FLOW_TEMPLATE).map(|content| content.replace(FLOW_NAME_PLACEHOLDER, flow_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fq_protocol::flow_models::FlowDefinition;

    #[test]
    fn test_get_config_template() {
        let config = get_template(CONFIG_TEMPLATE).expect("flowqa.toml should be embedded");
        assert!(config.contains("flows_dir"));
        assert!(config.contains("[timeouts]"));
    }

    #[test]
    fn test_get_nonexistent_template() {
        assert!(get_template("nonexistent.txt").is_none());
    }

    #[test]
    fn test_render_flow_template_parses() {
        let content = render_flow_template("checkout").expect("flow template should be embedded");
        let flow: FlowDefinition = serde_yaml::from_str(&content).expect("template must be valid");

        assert_eq!(flow.name, "checkout");
        assert!(!flow.steps.is_empty());
        assert!(content.contains("{{username}}"), "credential placeholders survive");
    }

    #[test]
    fn test_template_selectors_resolve() {
        let content = render_flow_template("demo").unwrap();
        let flow: FlowDefinition = serde_yaml::from_str(&content).unwrap();

        assert_eq!(flow.resolve_selector("@header.logo"), ".site-logo");
        assert_eq!(flow.resolve_selector("@login_button"), "button[type=submit]");
    }
}
