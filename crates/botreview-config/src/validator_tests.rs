use super::*;

fn settings_with_repos(repos: &[&str]) -> Settings {
    Settings {
        repositories: repos.iter().map(|s| s.to_string()).collect(),
        ..Settings::default()
    }
}

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&AppConfig::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_endpoint() {
    let mut config = AppConfig::default();
    config.browser.endpoint = "not a url".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "browser.endpoint"));
}

#[test]
fn test_validate_websocket_endpoint_rejected() {
    let mut config = AppConfig::default();
    config.browser.endpoint = "ws://localhost:9222/devtools/browser/x".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.message.contains("ws")));
}

#[test]
fn test_validate_zero_scan_interval() {
    let mut config = AppConfig::default();
    config.watch.scan_interval_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "watch.scan_interval_ms"));
}

#[test]
fn test_validate_fast_scan_interval_warning() {
    let mut config = AppConfig::default();
    config.watch.scan_interval_ms = 100;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_bad_pattern() {
    let mut config = AppConfig::default();
    config.watch.pull_request_pattern = "pull/(".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "watch.pull_request_pattern"));
}

#[test]
fn test_into_result_surfaces_first_error() {
    let mut config = AppConfig::default();
    config.settings.path = "  ".to_string();

    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("settings.path"));
}

#[test]
fn test_settings_repository_format() {
    let result =
        ConfigValidator::validate_settings(&settings_with_repos(&["acme/widgets", "acme"]));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, "repositories[1]");
}

#[test]
fn test_settings_duplicate_repository_warning() {
    let result = ConfigValidator::validate_settings(&settings_with_repos(&[
        "acme/widgets",
        "ACME/Widgets",
    ]));
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_settings_reviewer_whitespace_rejected() {
    let settings = Settings {
        reviewers: vec!["alice".into(), "bob smith".into()],
        ..Settings::default()
    };
    let result = ConfigValidator::validate_settings(&settings);
    assert!(result.errors.iter().any(|e| e.path == "reviewers[1]"));
}

#[test]
fn test_settings_enabled_without_username_warns() {
    let settings = Settings {
        enabled: true,
        ..Settings::default()
    };
    let result = ConfigValidator::validate_settings(&settings);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "username"));
}
