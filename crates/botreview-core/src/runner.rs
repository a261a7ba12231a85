//! One invocation of the engine against the current page.
//!
//! ```text
//! settings ─▶ enabled? ─▶ await page ─▶ classify ─▶ repository gate ─▶ approval ─▶ reviewers ─▶ notice
//! ```
//!
//! Each stage that needs settings reads them again from the store, so an edit
//! made while a run is waiting takes effect at the next decision point.

use botreview_config::{Settings, SettingsStore};
use tracing::{info, warn};

use crate::approval::{ApprovalOutcome, ApprovalWorkflowEngine};
use crate::classifier::{AuthorIdentity, PageClassifier};
use crate::driver::PageDriver;
use crate::gate::{EligibilityGate, RepositoryId};
use crate::notify::{NotificationPresenter, Severity};
use crate::reviewers::ReviewerAssignmentEngine;

pub const DETECTED_MESSAGE: &str = "Dependency bot PR detected - Auto-approving immediately...";
pub const SUCCESS_MESSAGE: &str = "✅ Dependency PR approved successfully!";
pub const FAILURE_MESSAGE: &str = "❌ Failed to approve dependency PR";

/// State threaded through the workflow stages of a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub repository: Option<RepositoryId>,
    pub author: Option<AuthorIdentity>,
}

/// What the workflow did on a qualifying pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    /// An approval is on record after the run.
    pub approved: bool,
    pub reviewers_requested: Vec<String>,
    pub approval: ApprovalOutcome,
    pub reviewers_completed: bool,
}

/// Top-level result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Disabled,
    /// The settings store could not be read at run start.
    SettingsUnavailable,
    NotAutomatedAgent { author: Option<AuthorIdentity> },
    RepositoryDenied { repository: Option<RepositoryId> },
    Completed(WorkflowOutcome),
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self, RunReport::Completed(outcome) if outcome.approved)
    }
}

/// Runs the engine once against a page.
pub struct Approver<'a> {
    driver: &'a dyn PageDriver,
    store: &'a dyn SettingsStore,
}

impl<'a> Approver<'a> {
    pub fn new(driver: &'a dyn PageDriver, store: &'a dyn SettingsStore) -> Self {
        Self { driver, store }
    }

    /// Run to completion. Never returns an error; every fault ends in a report.
    pub async fn run(&self) -> RunReport {
        let settings = match Settings::load(self.store).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                return RunReport::SettingsUnavailable;
            }
        };
        if !settings.enabled {
            info!("Auto-approval disabled in settings");
            return RunReport::Disabled;
        }

        let classifier = PageClassifier::new(self.driver);
        if !classifier.await_ready().await {
            info!("Classifying anyway after the readiness timeout");
        }
        let classification = classifier.classify().await;
        if !classification.automated {
            info!("Not a dependency bot pull request");
            return RunReport::NotAutomatedAgent {
                author: classification.author,
            };
        }

        let settings = self.refresh(settings).await;
        let gate = EligibilityGate::new(self.driver);
        let repository = gate.current_repository().await.ok().flatten();
        if !gate.repository_allowed(&settings).await {
            info!(allowed = ?settings.repositories, "Repository not in the allow-list");
            return RunReport::RepositoryDenied { repository };
        }

        let mut context = RunContext {
            settings,
            repository,
            author: classification.author,
        };
        let presenter = NotificationPresenter::new(self.driver);
        presenter.show(DETECTED_MESSAGE, Severity::Info).await;

        let outcome = self.run_workflow(&mut context).await;
        if outcome.approved {
            presenter.show(SUCCESS_MESSAGE, Severity::Success).await;
        } else {
            presenter.show(FAILURE_MESSAGE, Severity::Error).await;
        }
        RunReport::Completed(outcome)
    }

    async fn run_workflow(&self, context: &mut RunContext) -> WorkflowOutcome {
        context.settings = self.refresh(context.settings.clone()).await;
        let approval = ApprovalWorkflowEngine::new(self.driver)
            .run(&context.settings)
            .await;

        context.settings = self.refresh(context.settings.clone()).await;
        let reviewers = ReviewerAssignmentEngine::new(self.driver)
            .run(&context.settings)
            .await;
        if !reviewers.completed {
            warn!("Reviewer assignment did not complete");
        }

        info!(
            repository = ?context.repository.as_ref().map(ToString::to_string),
            author = ?context.author.as_ref().map(AuthorIdentity::as_str),
            ?approval,
            requested = ?reviewers.requested,
            "Workflow finished"
        );
        WorkflowOutcome {
            approved: approval.is_approved(),
            reviewers_requested: reviewers.requested,
            approval,
            reviewers_completed: reviewers.completed,
        }
    }

    /// Fresh settings, or `current` when the store cannot be read.
    async fn refresh(&self, current: Settings) -> Settings {
        match Settings::load(self.store).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to refresh settings, keeping the previous read: {}", e);
                current
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
