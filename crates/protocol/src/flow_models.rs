//! Flow definition models for `flows/<environment>/*.yaml`.
//!
//! A flow is an ordered list of typed steps plus the metadata the steps
//! need at run time (base URL, named selectors, crawl container).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

/// How a step failure influences the rest of the run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Skipped once a blocking step has failed.
    #[default]
    Normal,

    /// A failure skips every later normal step. Blocking steps are always
    /// attempted, even after an earlier blocking failure.
    Blocking,

    /// Used for forced escalation (an empty crawl).
    Critical,
}

impl Importance {
    pub fn is_blocking(self) -> bool {
        self == Importance::Blocking
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Normal => "normal",
            Importance::Blocking => "blocking",
            Importance::Critical => "critical",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of step kinds the engine knows how to execute.
///
/// Steps carry their action as a plain string so that flows with a typo
/// or a newer action still load; [`ActionKind::parse`] returns `None` for
/// anything outside this set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    CheckUi,
    TestResponsive,
    CheckLinks,
    FillForm,
    Click,
    Wait,
    CheckElement,
    CheckAccessibility,
    AssertText,
    Screenshot,
    CheckPerformance,
    AutoCrawl,
}

impl ActionKind {
    pub const ALL: [ActionKind; 13] = [
        ActionKind::Navigate,
        ActionKind::CheckUi,
        ActionKind::TestResponsive,
        ActionKind::CheckLinks,
        ActionKind::FillForm,
        ActionKind::Click,
        ActionKind::Wait,
        ActionKind::CheckElement,
        ActionKind::CheckAccessibility,
        ActionKind::AssertText,
        ActionKind::Screenshot,
        ActionKind::CheckPerformance,
        ActionKind::AutoCrawl,
    ];

    /// Resolve the authored action string. Matching is exact.
    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == action)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::CheckUi => "check_ui",
            ActionKind::TestResponsive => "test_responsive",
            ActionKind::CheckLinks => "check_links",
            ActionKind::FillForm => "fill_form",
            ActionKind::Click => "click",
            ActionKind::Wait => "wait",
            ActionKind::CheckElement => "check_element",
            ActionKind::CheckAccessibility => "check_accessibility",
            ActionKind::AssertText => "assert_text",
            ActionKind::Screenshot => "screenshot",
            ActionKind::CheckPerformance => "check_performance",
            ActionKind::AutoCrawl => "auto_crawl",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authored instruction in a flow.
///
/// Every field is optional on the wire. Handlers apply their own defaults
/// for the parameters they read and ignore the rest.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw action string, see [`ActionKind`].
    #[serde(default)]
    pub action: String,

    #[serde(default)]
    pub importance: Importance,

    /// Target for `navigate` and page key for `test_responsive`.
    /// Relative paths are joined to the flow's base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Element selector for `click`, `check_element` and `assert_text`.
    /// `@name` and `@group.key` refer to the flow's named selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Form container for `fill_form`. Defaults to `form`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_selector: Option<String>,

    /// Field selector to value for `fill_form`. Values may contain
    /// `{{username}}` style credential placeholders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,

    /// Milliseconds for `wait`. Defaults to 1000.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Expected text for `assert_text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Expected visibility for `check_element`. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    /// Whether `assert_text` expects the text to be present. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,

    /// Wait for a navigation to settle after a `click`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_navigation: Option<bool>,

    /// Upper bound on pages visited by `auto_crawl`. Defaults to 10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,

    /// Explicit output path for `screenshot`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Fail `check_links` when any broken link is found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_broken: Option<bool>,

    /// Load-event budget in milliseconds for `check_performance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_load_ms: Option<f64>,
}

impl Step {
    /// Create a step with the given name and action and default parameters.
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_field(mut self, selector: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(selector.into(), value.into());
        self
    }

    /// Wait time in milliseconds for `wait`.
    pub fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }

    /// The parsed action, or `None` when the action string is unknown.
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action)
    }
}

/// A named selector: either a single expression or a group of them.
///
/// ```yaml
/// selectors:
///   cart: ".cart-icon"
///   login:
///     username: "input[type='email']"
///     password: "input[type='password']"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(untagged)]
pub enum SelectorEntry {
    Single(String),
    Group(BTreeMap<String, String>),
}

/// Bookkeeping written by the flow manager when a flow is saved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct FlowMetadata {
    pub last_updated: String,
    pub environment: String,
}

/// A complete flow as loaded from disk.
///
/// # Example
///
/// ```yaml
/// name: checkout
/// description: Smoke test for the checkout path
/// base_url: https://shop.example.com
/// steps:
///   - name: Open home page
///     action: navigate
///     url: /
///   - name: Open cart
///     action: click
///     selector: "@cart"
///     importance: blocking
///   - name: Cart total is shown
///     action: assert_text
///     selector: .cart-total
///     text: "Total"
/// selectors:
///   cart: ".cart-icon"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct FlowDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Origin used to resolve relative step URLs.
    pub base_url: String,

    /// Authentication entry point. Falls back to `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    /// Steps in execution order. A `null` entry is kept and reported as an
    /// unknown step instead of failing the load.
    #[serde(default)]
    pub steps: Vec<Option<Step>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selectors: BTreeMap<String, SelectorEntry>,

    /// Container scoping link discovery for `auto_crawl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FlowMetadata>,
}

impl FlowDefinition {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            base_url: base_url.into(),
            login_url: None,
            steps: Vec::new(),
            selectors: BTreeMap::new(),
            nav_selector: None,
            metadata: None,
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(Some(step));
        self
    }

    /// URL used for authentication.
    pub fn login_target(&self) -> &str {
        self.login_url.as_deref().unwrap_or(&self.base_url)
    }

    /// Resolve `@name` / `@group.key` through the named selectors.
    ///
    /// Unknown references and plain selectors are returned unchanged.
    pub fn resolve_selector<'a>(&'a self, selector: &'a str) -> &'a str {
        let Some(reference) = selector.strip_prefix('@') else {
            return selector;
        };
        let (head, key) = match reference.split_once('.') {
            Some((head, key)) => (head, Some(key)),
            None => (reference, None),
        };
        match (self.selectors.get(head), key) {
            (Some(SelectorEntry::Single(value)), None) => value.as_str(),
            (Some(SelectorEntry::Group(group)), Some(key)) => {
                group.get(key).map(String::as_str).unwrap_or(selector)
            }
            _ => selector,
        }
    }
}

/// Login credentials supplied by the runner, never stored in a flow.
#[derive(Serialize, Deserialize, Clone, PartialEq, TS)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default = "default_username_selector")]
    pub username_selector: String,
    #[serde(default = "default_password_selector")]
    pub password_selector: String,
    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,
}

fn default_username_selector() -> String {
    "input[name='email'], input[type='email'], input[name='username'], input[id='username'], input[id='email']".to_string()
}

fn default_password_selector() -> String {
    "input[name='password'], input[type='password'], input[id='password']".to_string()
}

fn default_submit_selector() -> String {
    "button[type='submit'], .btn-outline-primary, input[type='submit'], button.login-button, .login-form button, form button".to_string()
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            username_selector: default_username_selector(),
            password_selector: default_password_selector(),
            submit_selector: default_submit_selector(),
        }
    }

    /// Look up a credential attribute by name, as used by `{{name}}`
    /// placeholders in form fields.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            "username_selector" => Some(&self.username_selector),
            "password_selector" => Some(&self.password_selector),
            "submit_selector" => Some(&self.submit_selector),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish_non_exhaustive()
    }
}
