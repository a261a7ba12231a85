//! `run` and `pages` subcommand handlers.

use botreview_cdp::{CdpClient, CdpPageDriver, PageInfo};
use botreview_config::{AppConfig, SettingsStore};
use botreview_core::{Approver, RunReport};
use tracing::{info, warn};

use crate::watch::PullRequestMatcher;

/// Attach to `page`, run the engine once, and detach.
pub(crate) async fn run_page(
    client: &CdpClient,
    store: &dyn SettingsStore,
    page: &PageInfo,
) -> Result<RunReport, Box<dyn std::error::Error>> {
    let session = client.attach_page(&page.id).await?;
    let driver = CdpPageDriver::new(session);

    let report = Approver::new(&driver, store).run().await;
    log_report(&page.id, &report);

    if let Err(e) = client.detach_page(driver.into_session()).await {
        warn!(target_id = %page.id, "Failed to detach: {}", e);
    }
    Ok(report)
}

fn log_report(target_id: &str, report: &RunReport) {
    match report {
        RunReport::Completed(outcome) => info!(
            target_id,
            approved = outcome.approved,
            reviewers = ?outcome.reviewers_requested,
            "Run completed"
        ),
        other => info!(target_id, report = ?other, "Run skipped"),
    }
}

/// Run once against `target`, or the first pull-request page when unset.
pub(crate) async fn run_once(
    client: &CdpClient,
    store: &dyn SettingsStore,
    config: &AppConfig,
    target: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = match target {
        Some(needle) => client.find_page(needle).await?,
        None => {
            let matcher = PullRequestMatcher::new(&config.watch.pull_request_pattern)?;
            client
                .list_pages()
                .await?
                .into_iter()
                .find(|page| matcher.key(&page.url).is_some())
                .ok_or("No open pull-request page")?
        }
    };

    info!(target_id = %page.id, url = %page.url, "Running once");
    let report = run_page(client, store, &page).await?;
    println!("{}", describe(&report));
    Ok(())
}

/// Print attachable pages, marking pull-request pages.
pub(crate) async fn list_pages(
    client: &CdpClient,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let matcher = PullRequestMatcher::new(&config.watch.pull_request_pattern)?;
    let pages = client.list_pages().await?;
    if pages.is_empty() {
        println!("No pages open in {}", client.browser());
        return Ok(());
    }
    for page in pages {
        let marker = if matcher.key(&page.url).is_some() { "PR" } else { "  " };
        println!("{} {}  {}  {}", marker, page.id, page.url, page.title);
    }
    Ok(())
}

/// One-line summary for terminal output.
pub(crate) fn describe(report: &RunReport) -> String {
    match report {
        RunReport::Disabled => "Disabled in settings".to_string(),
        RunReport::SettingsUnavailable => "Settings could not be read".to_string(),
        RunReport::NotAutomatedAgent { author } => match author {
            Some(author) => format!("Not a dependency bot pull request (author: {})", author),
            None => "Not a dependency bot pull request (author not found)".to_string(),
        },
        RunReport::RepositoryDenied { repository } => match repository {
            Some(repository) => format!("Repository {} is not allowed", repository),
            None => "Repository could not be determined".to_string(),
        },
        RunReport::Completed(outcome) => {
            let approval = if outcome.approved { "approved" } else { "not approved" };
            if outcome.reviewers_requested.is_empty() {
                format!("Pull request {}", approval)
            } else {
                format!(
                    "Pull request {}, requested {}",
                    approval,
                    outcome.reviewers_requested.join(", ")
                )
            }
        }
    }
}
