//! Issue discovery with per-issue enrichment.
//!
//! A search fetches one page of open issues, newest first, then enriches every
//! issue concurrently with its repository language and contribution templates.
//! Only the primary search can fail the call; enrichment misses fall back to
//! `"Unknown"` or to an absent template.

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{repo_full_name, ContentPayload, ProcessedIssue, RawIssue, RepoTemplates, RepositoryLanguage};
use crate::query::build_issue_query;
use crate::transport::{search_page, Page, TransportRouter};

/// Default page size for issue searches.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Candidate pull request template locations, in probe order.
pub const PR_TEMPLATE_PATHS: [&str; 4] = [
    ".github/pull_request_template.md",
    ".github/PULL_REQUEST_TEMPLATE.md",
    "pull_request_template.md",
    "PULL_REQUEST_TEMPLATE.md",
];

/// Candidate contributing guide locations, in probe order.
pub const CONTRIBUTING_PATHS: [&str; 3] = [
    "CONTRIBUTING.md",
    ".github/CONTRIBUTING.md",
    "docs/CONTRIBUTING.md",
];

/// Filters for an issue search. Empty fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub organization: Option<String>,
    pub language: Option<String>,
    pub labels: Vec<String>,
    pub text: Option<String>,
}

impl IssueFilter {
    /// Render the filter as a search query string.
    pub fn to_query(&self) -> String {
        build_issue_query(
            self.organization.as_deref(),
            self.language.as_deref(),
            &self.labels,
            self.text.as_deref(),
        )
    }
}

/// Issue search with language and template enrichment
pub struct IssueSearchService {
    router: TransportRouter,
}

impl IssueSearchService {
    /// Create a service issuing requests through `router`.
    pub fn new(router: TransportRouter) -> Self {
        Self { router }
    }

    /// Search open issues and enrich each one.
    ///
    /// The returned order is the order of the search response (newest first),
    /// whatever order the enrichment requests complete in.
    pub async fn search(&self, filter: &IssueFilter, page: Page) -> Result<Vec<ProcessedIssue>> {
        let query = filter.to_query();
        info!("Searching GitHub with query: {}", query);

        let results = search_page::<RawIssue>(&self.router, "issues", &query, "created", page).await?;
        info!("Found {} issues", results.total_count);

        // join_all yields outputs in input order, so results stay index aligned
        let processed = join_all(results.items.iter().map(|issue| self.enrich(issue))).await;

        Ok(processed)
    }

    async fn enrich(&self, issue: &RawIssue) -> ProcessedIssue {
        let full_name = repo_full_name(&issue.repository_url);
        let (language, templates) = futures::join!(
            self.fetch_language(full_name),
            self.fetch_repo_templates(full_name)
        );
        ProcessedIssue::from_raw(issue, language, templates)
    }

    /// Primary language of `owner/name`, `None` on any failure.
    pub async fn fetch_language(&self, full_name: &str) -> Option<String> {
        let response = match self.router.get(&format!("repos/{}", full_name)).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch repo language for {}: {}", full_name, e);
                return None;
            }
        };

        if !response.is_success() {
            debug!("Repository lookup for {} returned {}", full_name, response.status);
            return None;
        }

        match response.json::<RepositoryLanguage>() {
            Ok(repo) => repo.language,
            Err(e) => {
                warn!("Malformed repository payload for {}: {}", full_name, e);
                None
            }
        }
    }

    /// Probe the candidate template locations of `owner/name`.
    pub async fn fetch_repo_templates(&self, full_name: &str) -> RepoTemplates {
        RepoTemplates {
            pr_template: self.probe(full_name, &PR_TEMPLATE_PATHS).await,
            contributing_guide: self.probe(full_name, &CONTRIBUTING_PATHS).await,
        }
    }

    /// Try each path in order and stop at the first one with content.
    async fn probe(&self, full_name: &str, paths: &[&str]) -> Option<String> {
        for path in paths {
            if let Some(content) = self.fetch_content(full_name, path).await {
                debug!("Found {} in {}", path, full_name);
                return Some(content);
            }
        }
        None
    }

    async fn fetch_content(&self, full_name: &str, path: &str) -> Option<String> {
        let response = self
            .router
            .get(&format!("repos/{}/contents/{}", full_name, path))
            .await
            .ok()?;

        if !response.is_success() {
            return None;
        }

        response.json::<ContentPayload>().ok()?.decode()
    }
}
