//! Repository discovery: top, popular, growing and free-text search.

use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{ContentPayload, ProcessedRepository, RawRepository};
use crate::query::{build_repository_query, RepositoryKind};
use crate::transport::{search_page, Page, TransportRouter};

/// Default page size for repository listings.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Server side ordering of repository search results (always descending)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RepoSort {
    #[default]
    Stars,
    Updated,
    Created,
}

impl RepoSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoSort::Stars => "stars",
            RepoSort::Updated => "updated",
            RepoSort::Created => "created",
        }
    }
}

/// Languages offered as quick filters, most common first.
pub fn popular_languages() -> &'static [&'static str] {
    &[
        "JavaScript",
        "TypeScript",
        "Python",
        "Java",
        "Go",
        "Rust",
        "C++",
        "C#",
        "PHP",
        "Ruby",
        "Swift",
        "Kotlin",
        "Dart",
        "Shell",
        "HTML",
        "CSS",
        "Vue",
        "React",
        "Angular",
    ]
}

/// Repository listings and README lookups
pub struct RepositorySearchService {
    router: TransportRouter,
}

impl RepositorySearchService {
    /// Create a service issuing requests through `router`.
    pub fn new(router: TransportRouter) -> Self {
        Self { router }
    }

    /// Highest starred repositories.
    pub async fn fetch_top(&self, language: Option<&str>, page: Page) -> Result<Vec<ProcessedRepository>> {
        self.fetch(&RepositoryKind::Top, language, RepoSort::Stars, page)
            .await
    }

    /// Well starred repositories pushed to in the last 30 days.
    pub async fn fetch_popular(&self, language: Option<&str>, page: Page) -> Result<Vec<ProcessedRepository>> {
        self.fetch(&RepositoryKind::Popular, language, RepoSort::Updated, page)
            .await
    }

    /// Repositories created in the last 6 months that already gained stars.
    pub async fn fetch_growing(&self, language: Option<&str>, page: Page) -> Result<Vec<ProcessedRepository>> {
        self.fetch(&RepositoryKind::Growing, language, RepoSort::Stars, page)
            .await
    }

    /// Free-text repository search.
    pub async fn search(
        &self,
        query: &str,
        language: Option<&str>,
        sort: RepoSort,
        page: Page,
    ) -> Result<Vec<ProcessedRepository>> {
        self.fetch(&RepositoryKind::Custom(query.to_string()), language, sort, page)
            .await
    }

    async fn fetch(
        &self,
        kind: &RepositoryKind,
        language: Option<&str>,
        sort: RepoSort,
        page: Page,
    ) -> Result<Vec<ProcessedRepository>> {
        let query = build_repository_query(kind, language);
        info!("Searching repositories with query: {}", query);

        let results = search_page::<RawRepository>(&self.router, "repositories", &query, sort.as_str(), page).await?;
        if results.incomplete_results {
            warn!("GitHub reported incomplete results for '{}'", query);
        }
        info!("Found {} repositories", results.total_count);

        Ok(results.items.iter().map(ProcessedRepository::from).collect())
    }

    /// Decoded README of `owner/name`, or `None` when there is none to show.
    ///
    /// Never fails: a missing README is an ordinary outcome.
    pub async fn fetch_readme(&self, full_name: &str) -> Option<String> {
        let response = match self.router.get(&format!("repos/{}/readme", full_name)).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching README for {}: {}", full_name, e);
                return None;
            }
        };

        if !response.is_success() {
            debug!("No README for {} ({})", full_name, response.status);
            return None;
        }

        response.json::<ContentPayload>().ok()?.decode()
    }
}
