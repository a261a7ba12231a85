//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser (CDP) connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Page-load watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Interval between scans of the browser's page targets.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_ms: u64,

    /// Pattern a page URL must match to be treated as a pull-request page.
    #[serde(default = "default_pull_request_pattern")]
    pub pull_request_pattern: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval(),
            pull_request_pattern: default_pull_request_pattern(),
        }
    }
}

fn default_scan_interval() -> u64 {
    2000
}

fn default_pull_request_pattern() -> String {
    r"^https://github\.com/([^/]+)/([^/]+)/pull/(\d+)".to_string()
}

/// Location of the persistent settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> String {
    "~/.botreview/settings.json".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files. Defaults to `~/.botreview/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
