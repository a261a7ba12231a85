//! # botreview Config
//!
//! Application configuration (TOML) and the persistent settings store that
//! decides whether and how dependency-bot pull requests are handled.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::{ConfigError, SettingsError};
pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::{
    FileSettingsStore, MemorySettingsStore, Settings, SettingsRecord, SettingsStore, keys,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
