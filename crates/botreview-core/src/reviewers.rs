//! Reviewer requests.
//!
//! Computes which configured reviewers are missing from the pull request and
//! enters each of them through the host's reviewer picker. A name already on
//! the pull request is never requested again, so repeated runs are no-ops.

use std::collections::HashSet;
use std::time::Duration;

use botreview_config::Settings;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::driver::{ClickStyle, EventTarget, Key, PageDriver, SyntheticEvent};
use crate::error::StageError;
use crate::locator::{Locator, LocatorChain};
use crate::waiter::RetryPolicy;

/// Individual reviewers, by login.
const ASSIGNEE_ENTRIES: &str = "[data-assignee-name]";
const ASSIGNEE_ATTRIBUTE: &str = "data-assignee-name";
/// Team reviewers, rendered as `org/team`.
const TEAM_MENTIONS: &str = ".js-team-mention";

pub const REVIEWER_TRIGGER: LocatorChain = LocatorChain::new(
    "reviewer menu trigger",
    &[
        Locator::css(r#"summary[data-menu-trigger="reviewers-select-menu"]"#),
        Locator::css(r#"summary[aria-haspopup="menu"]"#),
        Locator::css(".hx_rsm-trigger"),
    ],
);

pub const FILTER_FIELD: LocatorChain = LocatorChain::new(
    "reviewer filter field",
    &[
        Locator::css("#review-filter-field"),
        Locator::css("input.js-filterable-field"),
        Locator::css(r#"input[placeholder="Type or choose a user"]"#),
    ],
);

pub const SUGGESTIONS: LocatorChain = LocatorChain::new(
    "reviewer suggestions",
    &[
        Locator::css(".select-menu-item"),
        Locator::css(r#"[role="menuitemcheckbox"]"#),
        Locator::css(".js-username"),
        Locator::css(r#"label[role="menuitemcheckbox"]"#),
    ],
);

/// Clicked to close the picker. Clicking any of these has no side effect.
pub const SAFE_ELEMENT: LocatorChain = LocatorChain::new(
    "menu dismissal target",
    &[
        Locator::css("h1.gh-header-title .js-issue-title"),
        Locator::css("h1.gh-header-title"),
        Locator::css(".js-issue-title"),
        Locator::css(r#"h1[class*="title"]"#),
        Locator::css("bdi.js-issue-title"),
        Locator::css(".markdown-title"),
        Locator::css("main"),
        Locator::css(r#"[role="main"]"#),
        Locator::css(".Layout-main"),
        Locator::css("#repo-content-pjax-container"),
        Locator::css("body"),
    ],
);

const CONVERSATION_SETTLE: Duration = Duration::from_millis(3000);
const MENU_OPEN_SETTLE: Duration = Duration::from_millis(1000);
/// Lets focus land on the first suggestion before Enter is sent.
const SUGGESTION_FOCUS_SETTLE: Duration = Duration::from_millis(1000);
const ENTRY_SETTLE: Duration = Duration::from_millis(500);
const FOCUS_SETTLE: Duration = Duration::from_millis(500);

/// Lower-cased names of users and teams already requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerSet(HashSet<String>);

impl ReviewerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, login: &str) {
        let login = login.trim();
        if !login.is_empty() {
            self.0.insert(login.to_lowercase());
        }
    }

    /// Index a team under both `org/team` and `team`.
    pub fn insert_team(&mut self, name: &str) {
        let full = name.trim();
        if full.is_empty() {
            return;
        }
        let short = full.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(full);
        self.0.insert(short.to_lowercase());
        self.0.insert(full.to_lowercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configured reviewers not yet present, in configured order. A name listed
/// twice (in any case) is requested once.
pub fn compute_delta(configured: &[String], existing: &ReviewerSet) -> Vec<String> {
    let mut seen = HashSet::new();
    configured
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| !existing.contains(name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Conversation view of a pull request: the first `/files` segment removed
/// and the fragment dropped. `None` when the URL is not a files view.
pub fn conversation_url(location: &Url) -> Option<Url> {
    if !location.path().contains("/files") {
        return None;
    }
    let mut url = location.clone();
    let path = location.path().replacen("/files", "", 1);
    url.set_path(&path);
    url.set_fragment(None);
    Some(url)
}

/// Result of one reviewer stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerOutcome {
    /// The stage ran to the end (including the no-op case).
    pub completed: bool,
    /// Names entered into the picker.
    pub requested: Vec<String>,
}

impl ReviewerOutcome {
    fn nothing_to_do() -> Self {
        Self {
            completed: true,
            requested: Vec::new(),
        }
    }
}

pub struct ReviewerAssignmentEngine<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> ReviewerAssignmentEngine<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    /// Request every configured reviewer that is not already present.
    /// Faults are logged and reported as an incomplete stage.
    pub async fn run(&self, settings: &Settings) -> ReviewerOutcome {
        if settings.reviewers.is_empty() {
            debug!("No reviewers configured");
            return ReviewerOutcome::nothing_to_do();
        }

        match self.assign(&settings.reviewers).await {
            Ok(outcome) => outcome,
            Err(StageError::ElementNotFound { target }) => {
                warn!(element = target, "Reviewer assignment stopped: element not found");
                ReviewerOutcome::default()
            }
            Err(StageError::Fault(e)) => {
                error!("Reviewer assignment stopped: {}", e);
                ReviewerOutcome::default()
            }
        }
    }

    /// Names of users and teams already on the pull request.
    pub async fn existing_reviewers(&self) -> Result<ReviewerSet, StageError> {
        let mut existing = ReviewerSet::new();
        for entry in self.driver.query_all(None, ASSIGNEE_ENTRIES).await? {
            if let Some(login) = entry.attr(ASSIGNEE_ATTRIBUTE) {
                existing.insert_user(login);
            }
        }
        for mention in self.driver.query_all(None, TEAM_MENTIONS).await? {
            existing.insert_team(&mention.text);
        }
        Ok(existing)
    }

    /// Existing reviewers are only read from the conversation view, so a tab
    /// left on `/files` is navigated back first, even when the delta then
    /// turns out empty. On the conversation view an empty delta touches
    /// nothing.
    async fn assign(&self, configured: &[String]) -> Result<ReviewerOutcome, StageError> {
        self.return_to_conversation().await?;

        let existing = self.existing_reviewers().await?;
        let delta = compute_delta(configured, &existing);
        if delta.is_empty() {
            info!("All configured reviewers already requested");
            return Ok(ReviewerOutcome::nothing_to_do());
        }
        info!(reviewers = ?delta, "Requesting reviewers");

        let trigger = REVIEWER_TRIGGER.require(self.driver).await?;
        self.driver.click(&trigger, ClickStyle::Direct).await?;
        tokio::time::sleep(MENU_OPEN_SETTLE).await;

        let mut requested = Vec::with_capacity(delta.len());
        for name in delta {
            self.enter_reviewer(&name).await?;
            requested.push(name);
        }

        self.close_menu().await?;
        Ok(ReviewerOutcome {
            completed: true,
            requested,
        })
    }

    async fn return_to_conversation(&self) -> Result<(), StageError> {
        let location = self.driver.location().await?;
        if let Some(url) = conversation_url(&location) {
            info!(url = %url, "Returning to the conversation view");
            self.driver.navigate(&url).await?;
            tokio::time::sleep(CONVERSATION_SETTLE).await;
        }
        Ok(())
    }

    async fn enter_reviewer(&self, name: &str) -> Result<(), StageError> {
        let field = FILTER_FIELD.require(self.driver).await?;
        debug!(reviewer = name, "Typing reviewer");
        self.driver.set_value(&field, name).await?;
        self.driver
            .dispatch(EventTarget::Element(&field), SyntheticEvent::Input)
            .await?;
        self.driver
            .dispatch(EventTarget::Element(&field), SyntheticEvent::KeyUp)
            .await?;

        if SUGGESTIONS
            .await_element(self.driver, RetryPolicy::STAGE)
            .await
            .is_some()
        {
            tokio::time::sleep(SUGGESTION_FOCUS_SETTLE).await;
        } else {
            warn!(reviewer = name, "No suggestions appeared, pressing Enter anyway");
        }

        for event in [
            SyntheticEvent::KeyDown(Key::Enter),
            SyntheticEvent::KeyPress(Key::Enter),
        ] {
            self.driver
                .dispatch(EventTarget::Element(&field), event)
                .await?;
        }
        tokio::time::sleep(ENTRY_SETTLE).await;
        info!(reviewer = name, "Reviewer entered");
        Ok(())
    }

    async fn close_menu(&self) -> Result<(), StageError> {
        if let Some(field) = FILTER_FIELD.resolve(self.driver).await? {
            self.driver
                .dispatch(
                    EventTarget::Element(&field),
                    SyntheticEvent::KeyDown(Key::ShiftTab),
                )
                .await?;
            tokio::time::sleep(FOCUS_SETTLE).await;
        }
        self.driver
            .dispatch(EventTarget::Focused, SyntheticEvent::KeyDown(Key::Enter))
            .await?;

        let safe = SAFE_ELEMENT.require(self.driver).await?;
        self.driver.click(&safe, ClickStyle::DispatchAndDirect).await?;
        debug!("Reviewer menu closed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "reviewers_tests.rs"]
mod tests;
