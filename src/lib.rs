//! # Repo Scout
//!
//! A Rust library for discovering GitHub repositories and contribution-ready
//! issues, with relay/direct request routing, per-issue enrichment and a soft
//! search quota for anonymous sessions.
//!
//! ## Main Components
//!
//! - [`GitHubSearcher`]: Facade running quota-gated searches
//! - [`IssueSearchService`]: Issue search enriched with language and contribution templates
//! - [`RepositorySearchService`]: Top, popular, growing and free-text repository listings
//! - [`TransportRouter`]: Preferred/fallback routing between the relay and the GitHub API
//! - [`SearchQuotaGate`]: Search counter persisted in local storage
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use repo_scout::{Config, GitHubSearcher, Gated, IssueFilter, Page, SessionFlag};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = Config::from_env();
//!     let session = SessionFlag::new(config.token.is_some());
//!     let mut searcher = GitHubSearcher::new(&config, Arc::new(session))?;
//!
//!     let filter = IssueFilter {
//!         language: Some("Rust".to_string()),
//!         labels: vec!["good first issue".to_string()],
//!         ..IssueFilter::default()
//!     };
//!     if let Gated::Completed(issues) = searcher.search_issues(&filter, Page::first(100)).await? {
//!         for issue in issues {
//!             println!("{} ({})", issue.title, issue.repo);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod args;
pub mod config;
pub mod error;
mod github_searcher;
pub mod issues;
pub mod models;
pub mod query;
pub mod quota;
pub mod repositories;
pub mod transport;

// Re-export main components for documentation and external use
pub use crate::args::{Args, Command, ListingArgs, QuotaAction};
pub use crate::config::Config;
pub use crate::error::{Result, ScoutError};
pub use crate::github_searcher::{Gated, GitHubSearcher};
pub use crate::issues::{IssueFilter, IssueSearchService};
pub use crate::models::{ProcessedIssue, ProcessedRepository, RepoTemplates};
pub use crate::quota::{LocalStorage, MemoryStore, SearchQuotaGate, Session, SessionFlag};
pub use crate::repositories::{popular_languages, RepoSort, RepositorySearchService};
pub use crate::transport::{Page, Transport, TransportRouter};
