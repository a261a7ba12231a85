//! Page-load watcher.
//!
//! Scans the browser's tabs on a fixed interval and runs the engine once for
//! every pull-request page load, keyed by tab and pull-request identity. A
//! tab that stays on the same pull request (including its `/files` view) is
//! not run again; leaving and coming back is a new load.

use std::collections::HashMap;
use std::time::Duration;

use botreview_cdp::{CdpClient, PageInfo};
use botreview_config::{AppConfig, SettingsStore};
use regex::Regex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::commands::run_page;

/// Identity of a pull request: the pattern's capture groups, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PullRequestKey(String);

/// Recognizes pull-request page URLs.
pub(crate) struct PullRequestMatcher {
    pattern: Regex,
}

impl PullRequestMatcher {
    pub(crate) fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Key for a pull-request URL, or `None` for any other page.
    pub(crate) fn key(&self, url: &str) -> Option<PullRequestKey> {
        let caps = self.pattern.captures(url)?;
        let groups: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
        let key = if groups.is_empty() {
            caps.get(0).map_or("", |m| m.as_str()).to_string()
        } else {
            groups.join("/")
        };
        Some(PullRequestKey(key.to_lowercase()))
    }
}

/// Remembers which pull request each tab was last run on.
#[derive(Default)]
pub(crate) struct LoadTracker {
    seen: HashMap<String, PullRequestKey>,
}

impl LoadTracker {
    /// Pages showing a pull request they were not already run on. The
    /// returned pages are recorded as handled.
    pub(crate) fn due<'a>(
        &mut self,
        pages: &'a [PageInfo],
        matcher: &PullRequestMatcher,
    ) -> Vec<&'a PageInfo> {
        let current: HashMap<&str, PullRequestKey> = pages
            .iter()
            .filter_map(|page| matcher.key(&page.url).map(|key| (page.id.as_str(), key)))
            .collect();
        self.seen
            .retain(|id, key| current.get(id.as_str()) == Some(&*key));

        pages
            .iter()
            .filter(|page| {
                let Some(key) = current.get(page.id.as_str()) else {
                    return false;
                };
                if self.seen.contains_key(&page.id) {
                    return false;
                }
                self.seen.insert(page.id.clone(), key.clone());
                true
            })
            .collect()
    }
}

/// Run until interrupted.
pub(crate) async fn watch(
    client: &CdpClient,
    store: &dyn SettingsStore,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let matcher = PullRequestMatcher::new(&config.watch.pull_request_pattern)?;
    let mut tracker = LoadTracker::default();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.watch.scan_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        browser = client.browser(),
        interval_ms = config.watch.scan_interval_ms,
        "Watching for pull-request pages"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watcher");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let pages = match client.list_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Failed to list pages: {}", e);
                continue;
            }
        };
        debug!("Scanned {} pages", pages.len());

        for page in tracker.due(&pages, &matcher) {
            info!(target_id = %page.id, url = %page.url, "New pull-request page load");
            if let Err(e) = run_page(client, store, page).await {
                warn!(target_id = %page.id, "Run failed: {}", e);
            }
        }
    }
}
