use std::time::Duration;

use clap::Parser;
use selector_helper::cli::commands::{
    CaptureRequest, cmd_candidates, cmd_capture, cmd_clear, cmd_format, cmd_history, open_store,
    resolve_framework, resolve_target,
};
use selector_helper::cli::config::{AppConfig, Cli, Commands, load_config};
use selector_helper::error::{ConfigError, HelperError};
use selector_helper::locator::formatter::Framework;
use selector_helper::sync::schema::InspectionSnapshot;

use crate::common::fixtures::{fixture_path, login_page};

mod common;

fn login_fixture() -> String {
    fixture_path("login_page.json").display().to_string()
}

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.panel.retry_delay_ms = 0;
    config
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_candidates() {
    let cli = Cli::parse_from([
        "selector-helper",
        "candidates",
        "--dom",
        "page.json",
        "--target",
        "#save",
        "--json",
    ]);
    match cli.command {
        Commands::Candidates { dom, target, json } => {
            assert_eq!(dom, "page.json");
            assert_eq!(target, "#save");
            assert!(json);
        }
        _ => panic!("Expected Candidates command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.framework.is_none());
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = Cli::parse_from([
        "selector-helper",
        "capture",
        "--dom",
        "page.json",
        "--target",
        "img",
        "--select",
        "2",
        "--framework",
        "playwright",
        "--store",
        "store.json",
        "-vv",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.framework.as_deref(), Some("playwright"));
    assert_eq!(cli.store.as_deref(), Some("store.json"));
    match cli.command {
        Commands::Capture { select, trace, .. } => {
            assert_eq!(select, Some(2));
            assert!(trace.is_none());
        }
        _ => panic!("Expected Capture command"),
    }
}

#[test]
fn cli_parse_clear_history_flag() {
    let cli = Cli::parse_from(["selector-helper", "clear", "--history"]);
    assert!(matches!(cli.command, Commands::Clear { history: true }));
}

#[test]
fn cli_requires_target() {
    assert!(Cli::try_parse_from(["selector-helper", "candidates", "--dom", "page.json"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.framework, Framework::Cypress);
    assert_eq!(config.inspector.flash_ms, 500);
    assert_eq!(config.inspector.descendant_limit, 10);
    assert_eq!(config.inspector.history_capacity, 50);
    assert_eq!(config.panel.retry_delay_ms, 100);
    assert_eq!(config.panel.status_ms, 2000);
    assert_eq!(config.panel.copy_clear_ms, 700);
}

#[test]
fn config_partial_yaml_keeps_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "framework: playwright\nstore_path: /tmp/helper.json\ninspector:\n  flash_ms: 250\n",
    )
    .unwrap();

    let config = load_config(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.framework, Framework::Playwright);
    assert_eq!(config.store_path.as_deref(), Some("/tmp/helper.json"));
    assert_eq!(config.inspector.flash_ms, 250);
    assert_eq!(config.inspector.descendant_limit, 10);
    assert_eq!(config.panel.copy_clear_ms, 700);

    let agent = config.agent_config();
    assert_eq!(agent.flash_duration, Duration::from_millis(250));
    assert_eq!(config.panel_config().retry.retry_delay, Duration::from_millis(100));
}

#[test]
fn config_malformed_yaml_is_an_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "framework: [not, a, framework]\n").unwrap();

    let err = load_config(Some(file.path().to_str().unwrap())).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml { .. }));
}

#[test]
fn config_named_file_must_exist() {
    let err = load_config(Some("/nonexistent/selector-helper.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn framework_flag_overrides_config() {
    let mut config = AppConfig::default();
    config.framework = Framework::Playwright;

    assert_eq!(resolve_framework(None, &config).unwrap(), Framework::Playwright);
    assert_eq!(resolve_framework(Some("cypress"), &config).unwrap(), Framework::Cypress);
    assert!(matches!(
        resolve_framework(Some("selenium"), &config),
        Err(HelperError::UnknownValue { what: "framework", .. })
    ));
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn target_must_be_unique() {
    let doc = login_page();

    assert!(resolve_target(&doc, "img").is_ok());
    assert!(matches!(
        resolve_target(&doc, "input"),
        Err(HelperError::AmbiguousTarget { count: 2, .. })
    ));
    assert!(matches!(
        resolve_target(&doc, "video"),
        Err(HelperError::AmbiguousTarget { count: 0, .. })
    ));
    assert!(matches!(resolve_target(&doc, "a:hover"), Err(HelperError::Selector(_))));
}

#[test]
fn format_command() {
    let out = cmd_format("text", "O'Brien", Framework::Cypress).unwrap();
    assert_eq!(out, "cy.contains('O\\'Brien')\n");

    let err = cmd_format("xpath", "//a", Framework::Cypress).unwrap_err();
    assert!(matches!(err, HelperError::UnknownValue { what: "candidate kind", .. }));
}

#[test]
fn candidates_command_lists_ranked_locators() {
    let out = cmd_candidates(
        &login_fixture(),
        "[data-testid=\"email\"]",
        Framework::Playwright,
        false,
        &AppConfig::default(),
    )
    .unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("3 candidates"));
    assert!(lines[1].contains("data-testid (own element)"));
    assert!(lines[1].ends_with("page.locator('[data-testid=\"email\"]')"));
}

#[test]
fn candidates_command_json() {
    let out = cmd_candidates(
        &login_fixture(),
        "img",
        Framework::Cypress,
        true,
        &AppConfig::default(),
    )
    .unwrap();

    let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows[0]["type"], "alt");
    assert_eq!(rows[0]["locator"], "cy.get('[alt=\"Company logo\"]')");
    assert_eq!(rows[0]["uniqueSelector"], "html > body > div > img");
}

#[test]
fn candidates_command_reports_missing_snapshot() {
    let err = cmd_candidates("/nope.json", "img", Framework::Cypress, false, &AppConfig::default())
        .unwrap_err();
    assert!(matches!(err, HelperError::Snapshot(_)));
}

#[test]
fn capture_history_and_clear_share_a_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let store_path = store_path.to_str().unwrap();
    let fixture = login_fixture();
    let config = fast_config();

    let request = CaptureRequest {
        dom_path: &fixture,
        target: "[data-testid=\"email\"]",
        select: None,
        trace_path: None,
        framework: Framework::Cypress,
    };
    let out = cmd_capture(&request, open_store(Some(store_path)).unwrap(), &config).unwrap();
    assert!(out.starts_with("Captured: cy.get('[data-testid=\"email\"]')"));
    assert!(out.contains("* [0] data-testid (own element)"));

    let refine = CaptureRequest {
        target: "img",
        select: Some(0),
        ..request
    };
    cmd_capture(&refine, open_store(Some(store_path)).unwrap(), &config).unwrap();

    let store = open_store(Some(store_path)).unwrap();
    let history = cmd_history(&store, Framework::Playwright, false).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("page.getByAltText('Company logo')"));
    assert!(lines[1].ends_with("page.locator('[data-testid=\"email\"]')"));

    assert_eq!(cmd_clear(&store, false).unwrap(), "Cleared!\n");
    let snapshot = InspectionSnapshot::read(&open_store(Some(store_path)).unwrap()).unwrap();
    assert!(snapshot.selector_options.is_empty());
    assert_eq!(snapshot.history.len(), 2);

    cmd_clear(&store, true).unwrap();
    let empty = cmd_history(&open_store(Some(store_path)).unwrap(), Framework::Cypress, false).unwrap();
    assert_eq!(empty, "History is empty.\n");
}

#[test]
fn capture_select_refines_output() {
    let fixture = login_fixture();
    let request = CaptureRequest {
        dom_path: &fixture,
        target: "[data-testid=\"email\"]",
        select: Some(1),
        trace_path: None,
        framework: Framework::Playwright,
    };

    let store = open_store(None).unwrap();
    let out = cmd_capture(&request, store.clone(), &fast_config()).unwrap();

    assert!(out.starts_with("Captured: page.locator('[name=\"email\"]')"));
    let snapshot = InspectionSnapshot::read(&store).unwrap();
    assert_eq!(snapshot.history[0].value, "[name=\"email\"]");
    assert_eq!(snapshot.framework, Framework::Playwright);
}

#[test]
fn capture_rejects_bad_option_index() {
    let fixture = login_fixture();
    let request = CaptureRequest {
        dom_path: &fixture,
        target: "img",
        select: Some(5),
        trace_path: None,
        framework: Framework::Cypress,
    };

    let err = cmd_capture(&request, open_store(None).unwrap(), &fast_config()).unwrap_err();
    assert!(matches!(err, HelperError::UnknownValue { what: "option index", .. }));
}
