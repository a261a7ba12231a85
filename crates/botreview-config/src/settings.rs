//! Persistent user settings.
//!
//! Settings live in a flat key-value record, the same shape a browser
//! extension keeps in synced storage. The engine reads them through the
//! [`SettingsStore`] trait and never caches a [`Settings`] value across a
//! point where the page might have changed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SettingsError;

/// Raw key-value record exchanged with a store.
pub type SettingsRecord = Map<String, Value>;

/// Recognized settings keys.
pub mod keys {
    pub const ENABLED: &str = "enabled";
    pub const USERNAME: &str = "username";
    pub const REVIEWERS: &str = "reviewers";
    pub const REPOSITORIES: &str = "repositories";

    pub const ALL: &[&str] = &[ENABLED, USERNAME, REVIEWERS, REPOSITORIES];
}

/// Host-provided persistent key-value store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the given keys. Keys without a stored value are omitted.
    async fn get(&self, keys: &[&'static str]) -> Result<SettingsRecord, SettingsError>;

    /// Merge the record into the store.
    async fn set(&self, record: SettingsRecord) -> Result<(), SettingsError>;
}

/// Typed view of the settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    /// Account whose approval makes the approval stage a no-op.
    pub username: Option<String>,
    /// Users or teams to request as reviewers, in configured order.
    pub reviewers: Vec<String>,
    /// Allowed `owner/name` repositories; empty allows all.
    pub repositories: Vec<String>,
}

impl Settings {
    /// Read the recognized keys from `store`, applying defaults for absent
    /// or mistyped values.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, SettingsError> {
        let record = store.get(keys::ALL).await?;
        Ok(Self::from_record(&record))
    }

    /// Write every recognized key to `store`.
    pub async fn save(&self, store: &dyn SettingsStore) -> Result<(), SettingsError> {
        store.set(self.to_record()).await
    }

    pub fn from_record(record: &SettingsRecord) -> Self {
        let username = record
            .get(keys::USERNAME)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            enabled: record
                .get(keys::ENABLED)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            username,
            reviewers: string_list(record.get(keys::REVIEWERS)),
            repositories: string_list(record.get(keys::REPOSITORIES)),
        }
    }

    pub fn to_record(&self) -> SettingsRecord {
        let mut record = Map::new();
        record.insert(keys::ENABLED.into(), Value::Bool(self.enabled));
        record.insert(
            keys::USERNAME.into(),
            Value::String(self.username.clone().unwrap_or_default()),
        );
        record.insert(
            keys::REVIEWERS.into(),
            Value::Array(self.reviewers.iter().cloned().map(Value::String).collect()),
        );
        record.insert(
            keys::REPOSITORIES.into(),
            Value::Array(
                self.repositories
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        record
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn select(record: &SettingsRecord, keys: &[&str]) -> SettingsRecord {
    record
        .iter()
        .filter(|(k, _)| keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// In-process store, used by tests and one-shot runs with inline settings.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    record: Mutex<SettingsRecord>,
}

impl MemorySettingsStore {
    pub fn new(record: SettingsRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.to_record())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&'static str]) -> Result<SettingsRecord, SettingsError> {
        Ok(select(&*self.record.lock().await, keys))
    }

    async fn set(&self, record: SettingsRecord) -> Result<(), SettingsError> {
        self.record.lock().await.extend(record);
        Ok(())
    }
}

/// JSON file backed store. A missing file reads as an empty record.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<SettingsRecord, SettingsError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Settings file {} not found, using defaults", self.path.display());
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(record) => Ok(record),
            other => Err(SettingsError::Malformed(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, keys: &[&'static str]) -> Result<SettingsRecord, SettingsError> {
        let record = self.read_all().await?;
        Ok(select(&record, keys))
    }

    async fn set(&self, record: SettingsRecord) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;

        let mut current = self.read_all().await?;
        current.extend(record);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let rendered = serde_json::to_string_pretty(&Value::Object(current))?;
        tokio::fs::write(&self.path, rendered).await?;

        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
