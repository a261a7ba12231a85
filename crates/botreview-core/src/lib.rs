//! # botreview Core
//!
//! Detection and approval engine for pull requests opened by dependency
//! update bots.
//!
//! ## Components
//!
//! - [`PageDriver`] - The host UI capability every stage goes through
//! - [`PageClassifier`] - Decides whether the author is an automated agent
//! - [`EligibilityGate`] - Repository allow-list and existing approvals
//! - [`ApprovalWorkflowEngine`] - Four-stage approval state machine
//! - [`ReviewerAssignmentEngine`] - Requests missing reviewers
//! - [`Approver`] - Runs all of the above once against a page
//!
//! Every element lookup is a [`LocatorChain`] evaluated in priority order and,
//! where the page may still be rendering, retried through [`wait_for`].

pub mod approval;
pub mod classifier;
pub mod driver;
pub mod error;
pub mod gate;
pub mod locator;
pub mod notify;
pub mod reviewers;
pub mod runner;
pub mod waiter;

#[cfg(test)]
mod testing;

pub use approval::{ApprovalOutcome, ApprovalState, ApprovalWorkflowEngine};
pub use classifier::{AuthorIdentity, Classification, PageClassifier};
pub use driver::{
    ClickStyle, Element, ElementPath, EventTarget, Key, PageDriver, PathStep, SyntheticEvent,
};
pub use error::{DriverError, StageError};
pub use gate::{EligibilityGate, RepositoryId, repository_allowed};
pub use locator::{Locator, LocatorChain};
pub use notify::{Notification, NotificationPresenter, Severity};
pub use reviewers::{ReviewerAssignmentEngine, ReviewerOutcome, ReviewerSet, compute_delta};
pub use runner::{Approver, RunContext, RunReport, WorkflowOutcome};
pub use waiter::{RetryPolicy, wait_for};
