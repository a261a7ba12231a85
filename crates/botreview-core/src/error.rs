//! Engine error types.

use thiserror::Error;

/// Faults raised by a [`PageDriver`](crate::PageDriver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// The element's path no longer resolves in the current document.
    #[error("Element detached: {0}")]
    Detached(String),

    /// A script evaluated in the page threw.
    #[error("Script error: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The connection to the host failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Why a workflow stage stopped.
#[derive(Debug, Error)]
pub enum StageError {
    /// A required locator resolved to nothing, after polling where applicable.
    #[error("{target} not found")]
    ElementNotFound { target: &'static str },

    /// Any other runtime fault inside the stage.
    #[error("Unexpected fault: {0}")]
    Fault(#[from] DriverError),
}

impl StageError {
    pub fn not_found(target: &'static str) -> Self {
        Self::ElementNotFound { target }
    }
}
