//! Transient on-page status overlay.

use std::time::Duration;

use tracing::{info, warn};

use crate::driver::PageDriver;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// Overlay background color.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Info => "#007bff",
            Severity::Success => "#28a745",
            Severity::Error => "#dc3545",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// Time until the overlay removes itself.
    pub ttl: Duration,
}

impl Notification {
    pub const DEFAULT_TTL: Duration = Duration::from_millis(3000);

    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            ttl: Self::DEFAULT_TTL,
        }
    }
}

/// Shows notifications on the page. Rendering failures are logged and
/// otherwise ignored.
pub struct NotificationPresenter<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> NotificationPresenter<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    pub async fn show(&self, message: impl Into<String>, severity: Severity) {
        let notification = Notification::new(message, severity);
        info!(severity = severity.as_str(), "{}", notification.message);

        if let Err(e) = self.driver.show_notification(&notification).await {
            warn!("Failed to render notification: {}", e);
        }
    }
}
