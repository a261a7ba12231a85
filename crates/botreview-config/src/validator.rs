//! Configuration validation.

use std::collections::HashSet;

use regex::Regex;
use url::Url;

use crate::error::ConfigError;
use crate::schema::AppConfig;
use crate::settings::Settings;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the application configuration.
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_watch(config, &mut result);

        if config.settings.path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "settings.path",
                "Settings path cannot be empty",
            ));
        }

        result
    }

    /// Validate a settings record before it is stored.
    pub fn validate_settings(settings: &Settings) -> ValidationResult {
        let mut result = ValidationResult::default();
        let repo_re = Regex::new(r"^[a-zA-Z0-9._-]+/[a-zA-Z0-9._-]+$").expect("static pattern");

        let mut seen = HashSet::new();
        for (i, repo) in settings.repositories.iter().enumerate() {
            let path = format!("repositories[{}]", i);
            if !repo_re.is_match(repo) {
                result.add_error(ValidationError::new(
                    path,
                    format!("'{}' is not of the form owner/repository", repo),
                ));
            } else if !seen.insert(repo.to_lowercase()) {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("Repository '{}' is listed more than once", repo),
                ));
            }
        }

        let mut seen = HashSet::new();
        for (i, reviewer) in settings.reviewers.iter().enumerate() {
            if reviewer.chars().any(char::is_whitespace) {
                result.add_error(ValidationError::new(
                    format!("reviewers[{}]", i),
                    format!("Reviewer '{}' contains whitespace", reviewer),
                ));
            } else if !seen.insert(reviewer.to_lowercase()) {
                result.add_warning(ValidationWarning::new(
                    format!("reviewers[{}]", i),
                    format!("Reviewer '{}' is listed more than once", reviewer),
                ));
            }
        }

        if settings.enabled && settings.username.is_none() {
            result.add_warning(ValidationWarning::new(
                "username",
                "No username configured; any existing approval will skip the approval step",
            ));
        }

        result
    }

    fn validate_browser(config: &AppConfig, result: &mut ValidationResult) {
        match Url::parse(&config.browser.endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => result.add_error(ValidationError::new(
                "browser.endpoint",
                format!("Unsupported scheme '{}', expected http or https", url.scheme()),
            )),
            Err(e) => result.add_error(ValidationError::new(
                "browser.endpoint",
                format!("Invalid URL: {}", e),
            )),
        }
    }

    fn validate_watch(config: &AppConfig, result: &mut ValidationResult) {
        if config.watch.scan_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "watch.scan_interval_ms",
                "scan_interval_ms must be greater than 0",
            ));
        } else if config.watch.scan_interval_ms < 250 {
            result.add_warning(ValidationWarning::new(
                "watch.scan_interval_ms",
                "scan_interval_ms below 250 polls the browser very aggressively",
            ));
        }

        if let Err(e) = Regex::new(&config.watch.pull_request_pattern) {
            result.add_error(ValidationError::new(
                "watch.pull_request_pattern",
                format!("Invalid pattern: {}", e),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
