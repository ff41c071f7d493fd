use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, TransportError};
use crate::issues::{IssueFilter, IssueSearchService};
use crate::models::{ProcessedIssue, ProcessedRepository};
use crate::quota::{KeyValueStore, LocalStorage, SearchQuotaGate, Session};
use crate::repositories::{RepoSort, RepositorySearchService};
use crate::transport::{Page, ReqwestTransport, Transport, TransportRouter};

/// Outcome of a quota-gated search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    /// The search ran
    Completed(T),
    /// The anonymous search limit is reached; nothing was requested
    LimitReached,
}

impl<T> Gated<T> {
    /// The search output, if the search ran.
    pub fn completed(self) -> Option<T> {
        match self {
            Gated::Completed(value) => Some(value),
            Gated::LimitReached => None,
        }
    }
}

/// Entry point tying both search services to the search quota.
pub struct GitHubSearcher {
    issues: IssueSearchService,
    repositories: RepositorySearchService,
    gate: SearchQuotaGate,
}

impl GitHubSearcher {
    /// Create a searcher that talks HTTP and keeps its counter on disk.
    pub fn new(config: &Config, session: Arc<dyn Session>) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| TransportError::new(&config.api_base, e))?;
        let store = LocalStorage::open(config.storage_path())?;

        if config.token.is_none() {
            warn!("No GitHub token configured, direct requests are unauthenticated");
        }

        Ok(Self::with_parts(
            Arc::new(transport),
            config,
            Box::new(store),
            session,
        ))
    }

    /// Create a searcher from explicit collaborators.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        config: &Config,
        store: Box<dyn KeyValueStore>,
        session: Arc<dyn Session>,
    ) -> Self {
        let router = TransportRouter::new(transport, config);
        GitHubSearcher {
            issues: IssueSearchService::new(router.clone()),
            repositories: RepositorySearchService::new(router),
            gate: SearchQuotaGate::new(store, session),
        }
    }

    /// The search quota gate.
    pub fn quota(&self) -> &SearchQuotaGate {
        &self.gate
    }

    /// Mutable access to the gate, e.g. to reset the counter.
    pub fn quota_mut(&mut self) -> &mut SearchQuotaGate {
        &mut self.gate
    }

    /// Check the gate and count the search when it is allowed.
    fn admit(&mut self) -> Result<bool> {
        if self.gate.is_limit_reached() {
            warn!(
                "Search blocked after {} anonymous searches",
                self.gate.count()
            );
            return Ok(false);
        }
        if self.gate.increment()? {
            info!("This was the last anonymous search, sign in for more");
        }
        Ok(true)
    }

    /// Search open issues, newest first, unless the quota blocks it.
    pub async fn search_issues(
        &mut self,
        filter: &IssueFilter,
        page: Page,
    ) -> Result<Gated<Vec<ProcessedIssue>>> {
        if !self.admit()? {
            return Ok(Gated::LimitReached);
        }
        self.issues.search(filter, page).await.map(Gated::Completed)
    }

    /// Highest starred repositories, unless the quota blocks it.
    pub async fn top_repositories(
        &mut self,
        language: Option<&str>,
        page: Page,
    ) -> Result<Gated<Vec<ProcessedRepository>>> {
        if !self.admit()? {
            return Ok(Gated::LimitReached);
        }
        self.repositories
            .fetch_top(language, page)
            .await
            .map(Gated::Completed)
    }

    /// Recently pushed repositories, unless the quota blocks it.
    pub async fn popular_repositories(
        &mut self,
        language: Option<&str>,
        page: Page,
    ) -> Result<Gated<Vec<ProcessedRepository>>> {
        if !self.admit()? {
            return Ok(Gated::LimitReached);
        }
        self.repositories
            .fetch_popular(language, page)
            .await
            .map(Gated::Completed)
    }

    /// Young repositories gaining stars, unless the quota blocks it.
    pub async fn growing_repositories(
        &mut self,
        language: Option<&str>,
        page: Page,
    ) -> Result<Gated<Vec<ProcessedRepository>>> {
        if !self.admit()? {
            return Ok(Gated::LimitReached);
        }
        self.repositories
            .fetch_growing(language, page)
            .await
            .map(Gated::Completed)
    }

    /// Free-text repository search, unless the quota blocks it.
    pub async fn search_repositories(
        &mut self,
        query: &str,
        language: Option<&str>,
        sort: RepoSort,
        page: Page,
    ) -> Result<Gated<Vec<ProcessedRepository>>> {
        if !self.admit()? {
            return Ok(Gated::LimitReached);
        }
        self.repositories
            .search(query, language, sort, page)
            .await
            .map(Gated::Completed)
    }

    /// README lookups are not searches and do not count against the quota.
    pub async fn readme(&self, full_name: &str) -> Option<String> {
        self.repositories.fetch_readme(full_name).await
    }
}
