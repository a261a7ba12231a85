//! Ordered locator strategies.
//!
//! Each target the workflow interacts with is described by a [`LocatorChain`]:
//! a list of alternative CSS strategies tried in priority order. Earlier
//! entries match the markup the host currently renders; later ones are
//! fallbacks for older or newer UI variants. Order is significant.

use tracing::debug;

use crate::driver::{Element, PageDriver};
use crate::error::{DriverError, StageError};
use crate::waiter::{RetryPolicy, wait_for};

/// One way of finding an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub selector: &'static str,
    /// When set, only matches whose text contains this substring qualify.
    pub text_contains: Option<&'static str>,
}

impl Locator {
    pub const fn css(selector: &'static str) -> Self {
        Self {
            selector,
            text_contains: None,
        }
    }

    pub const fn css_with_text(selector: &'static str, text: &'static str) -> Self {
        Self {
            selector,
            text_contains: Some(text),
        }
    }

    pub async fn find(&self, driver: &dyn PageDriver) -> Result<Option<Element>, DriverError> {
        match self.text_contains {
            None => driver.query(None, self.selector).await,
            Some(needle) => Ok(driver
                .query_all(None, self.selector)
                .await?
                .into_iter()
                .find(|el| el.text.contains(needle))),
        }
    }
}

/// Named, prioritized list of strategies for one target.
#[derive(Debug, Clone, Copy)]
pub struct LocatorChain {
    /// Human-readable target name used in logs and errors.
    pub target: &'static str,
    pub strategies: &'static [Locator],
}

impl LocatorChain {
    pub const fn new(target: &'static str, strategies: &'static [Locator]) -> Self {
        Self { target, strategies }
    }

    /// First element found by the highest-priority strategy that matches.
    pub async fn resolve(&self, driver: &dyn PageDriver) -> Result<Option<Element>, DriverError> {
        for (priority, locator) in self.strategies.iter().enumerate() {
            if let Some(element) = locator.find(driver).await? {
                debug!(
                    element = self.target,
                    selector = locator.selector,
                    priority,
                    "Resolved element"
                );
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Resolve once; absence is an [`StageError::ElementNotFound`].
    pub async fn require(&self, driver: &dyn PageDriver) -> Result<Element, StageError> {
        self.resolve(driver)
            .await?
            .ok_or_else(|| StageError::not_found(self.target))
    }

    /// Poll until the chain resolves or `policy` is exhausted.
    pub async fn await_element(
        &self,
        driver: &dyn PageDriver,
        policy: RetryPolicy,
    ) -> Option<Element> {
        wait_for(policy, move || self.resolve(driver)).await
    }

    /// Like [`await_element`](Self::await_element), but exhaustion is an error.
    pub async fn await_required(
        &self,
        driver: &dyn PageDriver,
        policy: RetryPolicy,
    ) -> Result<Element, StageError> {
        self.await_element(driver, policy)
            .await
            .ok_or_else(|| StageError::not_found(self.target))
    }
}
