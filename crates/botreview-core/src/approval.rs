//! Approval workflow state machine.
//!
//! Drives the host's review UI through four waiting stages:
//!
//! ```text
//! Idle ─▶ AwaitingReviewButton ─▶ AwaitingSubmitMenu ─▶ AwaitingApproveOption ─▶ AwaitingFinalSubmit ─▶ Approved
//!   │              │                      │                       │                        │
//!   │              └─▶ (no review action) └──────────────┬────────┴────────────────────────┘
//!   └─▶ Approved (already approved)                      ▼
//!                                                      Failed
//! ```
//!
//! Each waiting state locates its target with bounded polling, clicks it, and
//! sleeps for a fixed settle delay. Nothing is retained across states; each
//! state re-queries the document.

use std::fmt;
use std::time::Duration;

use botreview_config::Settings;
use tracing::{error, info, warn};

use crate::driver::{ClickStyle, PageDriver};
use crate::error::StageError;
use crate::gate::EligibilityGate;
use crate::locator::{Locator, LocatorChain};
use crate::waiter::RetryPolicy;

/// "Add your review" link on the conversation view.
pub const START_REVIEW: LocatorChain = LocatorChain::new(
    "add your review button",
    &[
        Locator::css(r#"a.btn.btn-primary.btn-sm[href*="/files#submit-review"]"#),
        Locator::css(r#"a[href*="/files#submit-review"]"#),
    ],
);

/// Dropdown trigger that opens the review submission panel.
pub const SUBMIT_MENU: LocatorChain = LocatorChain::new(
    "submit review menu",
    &[
        Locator::css(r#"button.ReviewMenuButton-module__ReviewMenuButton--RFyxN[data-variant="primary"]"#),
        Locator::css(r#"button[class*="ReviewMenuButton"][data-variant="primary"]"#),
    ],
);

pub const APPROVE_OPTION: LocatorChain = LocatorChain::new(
    "approve option",
    &[Locator::css(r#"input[value="approve"]"#)],
);

pub const FINAL_SUBMIT: LocatorChain = LocatorChain::new(
    "submit review button",
    &[
        Locator::css_with_text(
            r#"button.prc-Button-ButtonBase-c50BI[data-variant="primary"][data-no-visuals="true"]"#,
            "Submit review",
        ),
        Locator::css_with_text(
            r#"button.prc-Button-ButtonBase-c50BI[data-variant="primary"]"#,
            "Submit review",
        ),
        Locator::css_with_text(
            r#"button[data-variant="primary"][data-size="medium"]"#,
            "Submit review",
        ),
        Locator::css_with_text(r#"button[data-variant="primary"]"#, "Submit review"),
    ],
);

/// Wait for the navigation to the files view.
const NAVIGATION_SETTLE: Duration = Duration::from_millis(2000);
/// Wait for a dropdown or radio selection to render.
const MENU_SETTLE: Duration = Duration::from_millis(500);
/// Wait for the submitted review to register.
const SUBMIT_SETTLE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Idle,
    AwaitingReviewButton,
    AwaitingSubmitMenu,
    AwaitingApproveOption,
    AwaitingFinalSubmit,
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApprovalState::Idle => "idle",
            ApprovalState::AwaitingReviewButton => "awaiting review button",
            ApprovalState::AwaitingSubmitMenu => "awaiting submit menu",
            ApprovalState::AwaitingApproveOption => "awaiting approve option",
            ApprovalState::AwaitingFinalSubmit => "awaiting final submit",
        };
        f.write_str(name)
    }
}

/// Terminal state of the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// An approval was already on record; nothing was clicked.
    AlreadyApproved,
    /// This run submitted the approval.
    Approved,
    /// The page offered no review action. Reviewer assignment still runs.
    ReviewUnavailable,
    /// Stopped in `stage`.
    Failed { stage: ApprovalState },
}

impl ApprovalOutcome {
    pub fn is_approved(self) -> bool {
        matches!(
            self,
            ApprovalOutcome::AlreadyApproved | ApprovalOutcome::Approved
        )
    }
}

enum Step {
    Next(ApprovalState),
    Done(ApprovalOutcome),
}

pub struct ApprovalWorkflowEngine<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> ApprovalWorkflowEngine<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    /// Run to a terminal outcome. Never returns an error: faults and missing
    /// elements end in [`ApprovalOutcome::Failed`].
    pub async fn run(&self, settings: &Settings) -> ApprovalOutcome {
        let mut state = ApprovalState::Idle;
        loop {
            match self.step(state, settings).await {
                Ok(Step::Next(next)) => {
                    info!(from = %state, to = %next, "Approval transition");
                    state = next;
                }
                Ok(Step::Done(outcome)) => {
                    info!(from = %state, ?outcome, "Approval finished");
                    return outcome;
                }
                Err(StageError::ElementNotFound { target }) => {
                    warn!(stage = %state, element = target, "Approval stopped: element not found");
                    return ApprovalOutcome::Failed { stage: state };
                }
                Err(StageError::Fault(e)) => {
                    error!(stage = %state, "Approval stopped: {}", e);
                    return ApprovalOutcome::Failed { stage: state };
                }
            }
        }
    }

    async fn step(&self, state: ApprovalState, settings: &Settings) -> Result<Step, StageError> {
        match state {
            ApprovalState::Idle => {
                let gate = EligibilityGate::new(self.driver);
                if gate.already_approved(settings).await? {
                    info!("Pull request already approved, skipping approval");
                    return Ok(Step::Done(ApprovalOutcome::AlreadyApproved));
                }
                Ok(Step::Next(ApprovalState::AwaitingReviewButton))
            }
            ApprovalState::AwaitingReviewButton => {
                let Some(button) = START_REVIEW
                    .await_element(self.driver, RetryPolicy::STAGE)
                    .await
                else {
                    warn!("No review action on this page");
                    return Ok(Step::Done(ApprovalOutcome::ReviewUnavailable));
                };
                self.driver.click(&button, ClickStyle::Direct).await?;
                tokio::time::sleep(NAVIGATION_SETTLE).await;
                Ok(Step::Next(ApprovalState::AwaitingSubmitMenu))
            }
            ApprovalState::AwaitingSubmitMenu => {
                self.click_when_ready(&SUBMIT_MENU, MENU_SETTLE).await?;
                Ok(Step::Next(ApprovalState::AwaitingApproveOption))
            }
            ApprovalState::AwaitingApproveOption => {
                self.click_when_ready(&APPROVE_OPTION, MENU_SETTLE).await?;
                Ok(Step::Next(ApprovalState::AwaitingFinalSubmit))
            }
            ApprovalState::AwaitingFinalSubmit => {
                self.click_when_ready(&FINAL_SUBMIT, SUBMIT_SETTLE).await?;
                Ok(Step::Done(ApprovalOutcome::Approved))
            }
        }
    }

    async fn click_when_ready(
        &self,
        chain: &LocatorChain,
        settle: Duration,
    ) -> Result<(), StageError> {
        let element = chain
            .await_required(self.driver, RetryPolicy::STAGE)
            .await?;
        info!(element = chain.target, text = element.text.trim(), "Clicking");
        self.driver.click(&element, ClickStyle::Direct).await?;
        tokio::time::sleep(settle).await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
