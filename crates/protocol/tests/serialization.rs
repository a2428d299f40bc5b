use fq_protocol::*;

#[test]
fn test_flow_deserialization_from_yaml() {
    let yaml_str = r##"
name: checkout
description: Checkout smoke test
base_url: https://shop.example.com
login_url: https://shop.example.com/account/login
nav_selector: "#main-menu-navigation"
steps:
  - name: Open home page
    action: navigate
    url: /
  - name: Open cart
    action: click
    selector: "@cart"
    importance: blocking
  - ~
  - name: Fill login
    action: fill_form
    fields:
      "input[name='email']": "{{username}}"
selectors:
  cart: ".cart-icon"
  login:
    username: "input[type='email']"
    password: "input[type='password']"
"##;

    let flow: FlowDefinition = serde_yaml::from_str(yaml_str).expect("Failed to deserialize FlowDefinition");

    assert_eq!(flow.name, "checkout");
    assert_eq!(flow.steps.len(), 4);
    assert!(flow.steps[2].is_none());
    assert_eq!(flow.login_target(), "https://shop.example.com/account/login");
    assert_eq!(flow.nav_selector.as_deref(), Some("#main-menu-navigation"));

    let click = flow.steps[1].as_ref().expect("click step");
    assert_eq!(click.kind(), Some(ActionKind::Click));
    assert_eq!(click.importance, Importance::Blocking);

    let fill = flow.steps[3].as_ref().expect("fill step");
    assert_eq!(fill.fields.get("input[name='email']").map(String::as_str), Some("{{username}}"));

    assert!(matches!(flow.selectors.get("cart"), Some(SelectorEntry::Single(_))));
    assert!(matches!(flow.selectors.get("login"), Some(SelectorEntry::Group(_))));
}

#[test]
fn test_step_defaults_when_fields_missing() {
    let step: Step = serde_yaml::from_str("action: wait").expect("Failed to deserialize Step");

    assert_eq!(step.name, None);
    assert_eq!(step.importance, Importance::Normal);
    assert_eq!(step.duration, None);
    assert_eq!(step.kind(), Some(ActionKind::Wait));
}

#[test]
fn test_unknown_action_still_loads() {
    let step: Step = serde_yaml::from_str("name: Hover menu\naction: hover").expect("Failed to deserialize Step");

    assert_eq!(step.action, "hover");
    assert_eq!(step.kind(), None);
}

#[test]
fn test_action_kind_parse_covers_every_variant() {
    for kind in ActionKind::ALL {
        assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        let json = serde_json::to_value(kind).expect("Failed to serialize ActionKind");
        assert_eq!(json, kind.as_str());
    }
    assert_eq!(ActionKind::parse(""), None);
    assert_eq!(ActionKind::parse("Navigate"), None);
}

#[test]
fn test_resolve_selector() {
    let yaml_str = r##"
name: selectors
base_url: https://example.com
selectors:
  cart: ".cart-icon"
  login:
    username: "#email"
"##;
    let flow: FlowDefinition = serde_yaml::from_str(yaml_str).expect("Failed to deserialize FlowDefinition");

    assert_eq!(flow.resolve_selector("@cart"), ".cart-icon");
    assert_eq!(flow.resolve_selector("@login.username"), "#email");
    assert_eq!(flow.resolve_selector("@login.missing"), "@login.missing");
    assert_eq!(flow.resolve_selector("@login"), "@login");
    assert_eq!(flow.resolve_selector(".plain"), ".plain");
}

#[test]
fn test_importance_serialization() {
    let json = serde_json::to_value(Importance::Blocking).expect("Failed to serialize Importance");
    assert_eq!(json, "blocking");

    let deserialized: Importance = serde_json::from_value(json).expect("Failed to deserialize Importance");
    assert_eq!(deserialized, Importance::Blocking);
}

#[test]
fn test_step_outcome_skips_empty_fields() {
    let outcome = StepOutcome::new("Open home page", Importance::Normal).with_duration(1.5);

    let json = serde_json::to_value(&outcome).expect("Failed to serialize StepOutcome");
    assert_eq!(json["step"], "Open home page");
    assert_eq!(json["importance"], "normal");
    assert!(json.get("error").is_none());
    assert!(json.get("violations").is_none());
}

#[test]
fn test_html_snippet_is_truncated_by_characters() {
    let html = "é".repeat(HTML_SNIPPET_LIMIT + 50);
    let outcome = StepOutcome::new("Check", Importance::Normal).with_html_snippet(&html);

    let snippet = outcome.html_snippet.expect("snippet");
    assert_eq!(snippet.chars().count(), HTML_SNIPPET_LIMIT);
}

#[test]
fn test_flow_execution_result_serialization() {
    let mut result = FlowExecutionResult::new("checkout", "uat");
    result.passed.push(StepOutcome::new("Open home page", Importance::Normal));
    result.failed.push(
        StepOutcome::new("Open cart", Importance::Blocking).with_error("Click error (attempt 2): timeout"),
    );
    result.coverage_summary = Some(CoverageSummary::from_buckets(
        2,
        &result.passed,
        &result.failed,
        &result.skipped,
    ));

    let json = serde_json::to_string(&result).expect("Failed to serialize FlowExecutionResult");
    let deserialized: FlowExecutionResult =
        serde_json::from_str(&json).expect("Failed to deserialize FlowExecutionResult");

    assert_eq!(deserialized, result);
    let summary = deserialized.coverage_summary.expect("summary");
    assert_eq!(summary.failed_steps, vec!["Open cart".to_string()]);
}

#[test]
fn test_run_event_serialization() {
    let event = RunEvent::OutcomeRecorded {
        run_id: uuid::Uuid::new_v4(),
        bucket: Bucket::Skipped,
        outcome: StepOutcome::new("Later step", Importance::Normal)
            .with_reason("Skipped due to blocking failure"),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize RunEvent");
    assert_eq!(json["type"], "outcomeRecorded");
    assert_eq!(json["payload"]["bucket"], "skipped");
    assert_eq!(json["payload"]["outcome"]["reason"], "Skipped due to blocking failure");
}

#[test]
fn test_credentials_debug_hides_password() {
    let credentials = Credentials::new("qa@example.com", "hunter2");
    let debug = format!("{credentials:?}");

    assert!(debug.contains("qa@example.com"));
    assert!(!debug.contains("hunter2"));
    assert_eq!(credentials.attribute("password"), Some("hunter2"));
    assert_eq!(credentials.attribute("token"), None);
}

#[test]
fn test_js_errors_omitted_when_empty() {
    let mut result = FlowExecutionResult::new("home", "prod");
    let json = serde_json::to_value(&result).expect("Failed to serialize FlowExecutionResult");
    assert!(json.get("js_errors").is_none());

    result.js_errors.push(JsError {
        url: "https://shop.example.com/".to_string(),
        message: "Uncaught ReferenceError: dataLayer is not defined".to_string(),
    });
    let json = serde_json::to_value(&result).expect("Failed to serialize FlowExecutionResult");
    assert_eq!(json["js_errors"][0]["url"], "https://shop.example.com/");

    let deserialized: FlowExecutionResult =
        serde_json::from_value(json).expect("Failed to deserialize FlowExecutionResult");
    assert_eq!(deserialized.js_errors, result.js_errors);
}
