//! Pull-request author classification.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::driver::{Element, PageDriver};
use crate::error::DriverError;
use crate::locator::{Locator, LocatorChain};
use crate::waiter::RetryPolicy;

/// Where the pull-request author renders, most current markup first.
pub const AUTHOR: LocatorChain = LocatorChain::new(
    "pull request author",
    &[
        Locator::css("a.author"),
        Locator::css(".author a"),
        Locator::css(r#"[data-hovercard-type="user"]"#),
        Locator::css(".timeline-comment-header-text a"),
        Locator::css(r#".gh-header-meta a[data-hovercard-type="user"]"#),
        Locator::css(r#"a[data-hovercard-type="user"]:first-of-type"#),
    ],
);

/// Extra time granted after the author first appears, so the rest of the
/// header and sidebar finish rendering.
const READY_SETTLE: Duration = Duration::from_millis(1000);

const KNOWN_AGENTS: &[&str] = &["dependabot[bot]", "dependabot", "renovate[bot]", "renovate"];

/// Substrings that identify an agent even when the platform decorates the name.
const AGENT_MARKERS: &[&str] = &["dependabot", "renovate"];

/// Normalized (trimmed, lower-cased) author display text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorIdentity(String);

impl AuthorIdentity {
    pub fn from_display_text(text: &str) -> Self {
        Self(text.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_automated_agent(&self) -> bool {
        let name = self.as_str();
        !name.is_empty()
            && (KNOWN_AGENTS.contains(&name)
                || AGENT_MARKERS.iter().any(|marker| name.contains(marker)))
    }
}

impl fmt::Display for AuthorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of classifying the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub author: Option<AuthorIdentity>,
    pub automated: bool,
}

pub struct PageClassifier<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> PageClassifier<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    pub async fn locate_author_element(&self) -> Result<Option<Element>, DriverError> {
        AUTHOR.resolve(self.driver).await
    }

    /// Wait for the author element to render, then settle briefly.
    ///
    /// Returns `false` on timeout; callers proceed with one more
    /// classification attempt regardless.
    pub async fn await_ready(&self) -> bool {
        match AUTHOR.await_element(self.driver, RetryPolicy::PAGE_READY).await {
            Some(_) => {
                debug!("Author element found, settling");
                tokio::time::sleep(READY_SETTLE).await;
                true
            }
            None => {
                warn!("Timed out waiting for the author element");
                false
            }
        }
    }

    /// Classify the page. Any failure to read the author is "not automated".
    pub async fn classify(&self) -> Classification {
        let author = match self.locate_author_element().await {
            Ok(Some(element)) => Some(AuthorIdentity::from_display_text(&element.text)),
            Ok(None) => {
                info!("No author element found with any locator");
                None
            }
            Err(e) => {
                warn!("Failed to read the author element: {}", e);
                None
            }
        };

        let automated = author
            .as_ref()
            .is_some_and(AuthorIdentity::is_automated_agent);
        if let Some(author) = &author {
            info!(author = %author, automated, "Classified pull request author");
        }

        Classification { author, automated }
    }

    pub async fn is_automated_agent_author(&self) -> bool {
        self.classify().await.automated
    }
}
