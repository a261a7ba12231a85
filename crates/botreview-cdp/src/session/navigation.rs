//! Navigation operations.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::error::CdpError;

use super::core::PageSession;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Navigate and wait until the new document is interactive.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(error.to_string()));
        }

        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Poll `document.readyState` until `interactive` or `complete`.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = tokio::time::Instant::now();

        loop {
            // Evaluation fails while the execution context is being replaced.
            if let Ok(state) = self.evaluate("document.readyState").await {
                if matches!(state.as_str(), Some("complete" | "interactive")) {
                    return Ok(());
                }
            }

            if start.elapsed() > LOAD_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(LOAD_POLL).await;
        }
    }

    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("location.href is not a string".to_string()))
    }
}
