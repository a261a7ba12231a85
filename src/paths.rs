//! Default file locations.

use std::path::PathBuf;

use botreview_config::{ConfigLoader, LoggingConfig};

/// Get the ~/.botreview directory path.
pub(crate) fn botreview_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".botreview"))
        .unwrap_or_else(|| PathBuf::from(".botreview"))
}

pub(crate) fn default_config_file() -> PathBuf {
    botreview_dir().join("config.toml")
}

/// Log directory from `[logging] dir`, or ~/.botreview/logs.
pub(crate) fn log_dir(logging: &LoggingConfig) -> PathBuf {
    logging
        .dir
        .as_deref()
        .map(ConfigLoader::expand_path)
        .unwrap_or_else(|| botreview_dir().join("logs"))
}
