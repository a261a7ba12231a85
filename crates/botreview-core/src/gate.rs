//! Eligibility checks: repository allow-list and existing approvals.

use std::fmt;

use botreview_config::Settings;
use tracing::{debug, info};
use url::Url;

use crate::driver::PageDriver;
use crate::error::DriverError;

/// Review entries in the conversation timeline.
const REVIEW_ENTRIES: &str = ".js-reviews-container .timeline-comment";
const REVIEW_STATE: &str = ".review-summary-state";
/// Success check rendered next to a reviewer who approved.
const APPROVED_MARKER: &str = ".octicon-check.color-fg-success";

/// `owner/name` of the repository a page belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    /// First two non-empty path segments, or `None` when there are fewer.
    pub fn from_path(path: &str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?;
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        Self::from_path(url.path())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive comparison against an `owner/name` string.
    pub fn matches(&self, entry: &str) -> bool {
        entry.trim().eq_ignore_ascii_case(&self.to_string())
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Allow-list check. An unknown repository is never allowed; an empty list
/// allows every known one.
pub fn repository_allowed(repository: Option<&RepositoryId>, settings: &Settings) -> bool {
    let Some(repository) = repository else {
        return false;
    };
    settings.repositories.is_empty()
        || settings
            .repositories
            .iter()
            .any(|entry| repository.matches(entry))
}

/// Quote a value for use inside a CSS attribute selector.
fn css_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

pub(crate) fn assignee_selector(username: &str) -> String {
    format!("[data-assignee-name={}]", css_string(username))
}

pub struct EligibilityGate<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> EligibilityGate<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    pub async fn current_repository(&self) -> Result<Option<RepositoryId>, DriverError> {
        let location = self.driver.location().await?;
        Ok(RepositoryId::from_url(&location))
    }

    /// Read the location and apply [`repository_allowed`]. Faults deny.
    pub async fn repository_allowed(&self, settings: &Settings) -> bool {
        let repository = match self.current_repository().await {
            Ok(repository) => repository,
            Err(e) => {
                debug!("Could not read page location: {}", e);
                None
            }
        };
        let allowed = repository_allowed(repository.as_ref(), settings);
        let shown = repository
            .as_ref()
            .map_or_else(|| "<unknown>".to_string(), ToString::to_string);
        info!(repository = %shown, allowed, "Checked repository allow-list");
        allowed
    }

    /// Whether an approval is already on record.
    ///
    /// With a username configured only that user's reviewer entry counts; a
    /// user who is not a listed reviewer cannot have approved, so absence is
    /// `false` rather than a fall back to the generic scan. Without a
    /// username any approved review entry counts.
    pub async fn already_approved(&self, settings: &Settings) -> Result<bool, DriverError> {
        match settings.username.as_deref() {
            Some(username) => self.user_approved(username).await,
            None => self.any_review_approved().await,
        }
    }

    async fn user_approved(&self, username: &str) -> Result<bool, DriverError> {
        let Some(entry) = self
            .driver
            .query(None, &assignee_selector(username))
            .await?
        else {
            info!(username, "User is not among the reviewers");
            return Ok(false);
        };

        let approved = match self.driver.parent(&entry).await? {
            Some(row) => self
                .driver
                .query(Some(&row), APPROVED_MARKER)
                .await?
                .is_some(),
            None => false,
        };
        info!(username, approved, "Checked reviewer approval state");
        Ok(approved)
    }

    async fn any_review_approved(&self) -> Result<bool, DriverError> {
        debug!("No username configured, scanning all reviews");
        for review in self.driver.query_all(None, REVIEW_ENTRIES).await? {
            if let Some(state) = self.driver.query(Some(&review), REVIEW_STATE).await? {
                if state.text.to_lowercase().contains("approved") {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNode, FakePage};

    const PR: &str = "https://github.com/acme/widgets/pull/7";

    fn settings(repos: &[&str], username: Option<&str>) -> Settings {
        Settings {
            enabled: true,
            username: username.map(str::to_string),
            reviewers: vec![],
            repositories: repos.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_repository_from_path() {
        let repo = RepositoryId::from_path("/acme/widgets/pull/7/files").unwrap();
        assert_eq!(repo.owner(), "acme");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_repository_requires_two_segments() {
        assert!(RepositoryId::from_path("/acme").is_none());
        assert!(RepositoryId::from_path("/").is_none());
        assert!(RepositoryId::from_path("").is_none());
    }

    #[test]
    fn test_empty_allow_list_allows_any_repository() {
        let repo = RepositoryId::from_path("/anyone/anything").unwrap();
        assert!(repository_allowed(Some(&repo), &settings(&[], None)));
    }

    #[test]
    fn test_allow_list_is_case_insensitive_exact_match() {
        let allow = settings(&["org/repo"], None);
        let same = RepositoryId::from_path("/Org/REPO/pull/1").unwrap();
        let other = RepositoryId::from_path("/org/other/pull/1").unwrap();
        let prefix = RepositoryId::from_path("/org/repo-two/pull/1").unwrap();

        assert!(repository_allowed(Some(&same), &allow));
        assert!(!repository_allowed(Some(&other), &allow));
        assert!(!repository_allowed(Some(&prefix), &allow));
    }

    #[test]
    fn test_unknown_repository_fails_closed() {
        assert!(!repository_allowed(None, &settings(&[], None)));
    }

    #[test]
    fn test_assignee_selector_escapes_quotes() {
        assert_eq!(assignee_selector("octocat"), r#"[data-assignee-name="octocat"]"#);
        assert_eq!(assignee_selector(r#"a"b"#), r#"[data-assignee-name="a\"b"]"#);
    }

    #[tokio::test]
    async fn test_gate_reads_repository_from_location() {
        let page = FakePage::new(PR);
        let gate = EligibilityGate::new(&page);
        assert!(gate.repository_allowed(&settings(&["ACME/widgets"], None)).await);
        assert!(!gate.repository_allowed(&settings(&["acme/gadgets"], None)).await);
    }

    #[tokio::test]
    async fn test_gate_denies_root_page() {
        let page = FakePage::new("https://github.com/");
        let gate = EligibilityGate::new(&page);
        assert!(gate.current_repository().await.unwrap().is_none());
        assert!(!gate.repository_allowed(&settings(&[], None)).await);
    }

    #[tokio::test]
    async fn test_user_approved_with_marker() {
        let page = FakePage::new(PR);
        let row = page.add(FakeNode::new("p", ""));
        let entry = page.insert(
            &assignee_selector("octocat"),
            FakeNode::new("span", "octocat").attr("data-assignee-name", "octocat"),
        );
        page.set_parent(entry, row);
        page.insert_within(row, APPROVED_MARKER, FakeNode::new("svg", ""));

        let gate = EligibilityGate::new(&page);
        assert!(gate.already_approved(&settings(&[], Some("octocat"))).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_listed_without_marker() {
        let page = FakePage::new(PR);
        let row = page.add(FakeNode::new("p", ""));
        let entry = page.insert(&assignee_selector("octocat"), FakeNode::new("span", "octocat"));
        page.set_parent(entry, row);

        let gate = EligibilityGate::new(&page);
        assert!(!gate.already_approved(&settings(&[], Some("octocat"))).await.unwrap());
    }

    #[tokio::test]
    async fn test_absent_user_does_not_fall_back_to_generic_scan() {
        let page = FakePage::new(PR);
        let review = page.insert(REVIEW_ENTRIES, FakeNode::new("div", ""));
        page.insert_within(review, REVIEW_STATE, FakeNode::new("span", "approved these changes"));

        let gate = EligibilityGate::new(&page);
        assert!(!gate.already_approved(&settings(&[], Some("octocat"))).await.unwrap());
        assert!(gate.already_approved(&settings(&[], None)).await.unwrap());
    }

    #[tokio::test]
    async fn test_generic_scan_ignores_other_states() {
        let page = FakePage::new(PR);
        let first = page.insert(REVIEW_ENTRIES, FakeNode::new("div", ""));
        page.insert_within(first, REVIEW_STATE, FakeNode::new("span", "requested changes"));
        page.insert(REVIEW_ENTRIES, FakeNode::new("div", "no state here"));

        let gate = EligibilityGate::new(&page);
        assert!(!gate.already_approved(&settings(&[], None)).await.unwrap());
    }
}
