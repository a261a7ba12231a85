use super::*;

#[test]
fn test_app_config_default() {
    let config = AppConfig::default();
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert_eq!(config.watch.scan_interval_ms, 2000);
    assert_eq!(config.settings.path, "~/.botreview/settings.json");
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.dir.is_none());
}

#[test]
fn test_default_pull_request_pattern_matches_pull_pages() {
    let re = regex::Regex::new(&WatchConfig::default().pull_request_pattern).unwrap();
    assert!(re.is_match("https://github.com/acme/widgets/pull/42"));
    assert!(re.is_match("https://github.com/acme/widgets/pull/42/files"));
    assert!(!re.is_match("https://github.com/acme/widgets/issues/42"));
}

#[test]
fn test_partial_section_keeps_defaults() {
    let config: AppConfig = toml::from_str("[watch]\nscan_interval_ms = 10").unwrap();
    assert_eq!(config.watch.scan_interval_ms, 10);
    assert!(config.watch.pull_request_pattern.contains("pull"));
}

#[test]
fn test_serialize_round_trip_omits_unset_log_dir() {
    let rendered = toml::to_string(&AppConfig::default()).unwrap();
    assert!(rendered.contains("[browser]"));
    assert!(!rendered.contains("dir ="));
}
