//! Integration tests for the quota-gated search facade.
//!
//! A scripted transport stands in for GitHub, so these run offline.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use repo_scout::error::TransportError;
use repo_scout::transport::{Attempt, HttpResponse};
use repo_scout::{Config, Gated, GitHubSearcher, IssueFilter, MemoryStore, Page, SessionFlag, Transport};

/// Answers `/search/*` with canned bodies and everything else with 404.
#[derive(Default)]
struct CannedGitHub {
    calls: Mutex<Vec<String>>,
    outages: Mutex<HashSet<String>>,
}

impl CannedGitHub {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn take_down(&self, base: &str) {
        self.outages.lock().unwrap().insert(base.to_string());
    }
}

#[async_trait]
impl Transport for CannedGitHub {
    async fn get(&self, attempt: &Attempt) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(attempt.url.clone());

        let down = self
            .outages
            .lock()
            .unwrap()
            .iter()
            .any(|base| attempt.url.starts_with(base));
        if down {
            return Err(TransportError::new(&attempt.url, "connection refused"));
        }

        let body = if attempt.url.contains("/search/issues?") {
            json!({
                "total_count": 1,
                "incomplete_results": false,
                "items": [{
                    "id": 1,
                    "title": "Document the config file",
                    "html_url": "https://github.com/acme/scout/issues/1",
                    "repository_url": "https://api.github.com/repos/acme/scout",
                    "labels": [{"name": "documentation", "color": "0075ca"}],
                    "user": {"login": "octocat"},
                    "created_at": "2024-06-01T12:00:00Z",
                    "comments": 0,
                    "state": "open"
                }]
            })
        } else if attempt.url.contains("/search/repositories?") {
            json!({ "total_count": 0, "incomplete_results": false, "items": [] })
        } else if attempt.url.ends_with("/repos/acme/scout") {
            json!({ "language": "Rust" })
        } else {
            return Ok(HttpResponse::new(StatusCode::NOT_FOUND, "{}"));
        };

        Ok(HttpResponse::new(StatusCode::OK, body.to_string()))
    }
}

fn config(use_proxy: bool) -> Config {
    Config {
        api_base: "https://api.github.com".to_string(),
        proxy_base: Some("http://localhost:3000/api/github".to_string()),
        use_proxy,
        token: None,
        ..Config::default()
    }
}

fn searcher(github: &Arc<CannedGitHub>, session: &SessionFlag, use_proxy: bool) -> GitHubSearcher {
    GitHubSearcher::with_parts(
        github.clone(),
        &config(use_proxy),
        Box::new(MemoryStore::default()),
        Arc::new(session.clone()),
    )
}

#[tokio::test]
async fn anonymous_searches_stop_at_the_limit() {
    let github = Arc::new(CannedGitHub::default());
    let session = SessionFlag::new(false);
    let mut searcher = searcher(&github, &session, false);

    for _ in 0..5 {
        let outcome = searcher.top_repositories(None, Page::first(30)).await.unwrap();
        assert!(matches!(outcome, Gated::Completed(_)));
    }
    assert!(searcher.quota().is_limit_reached());

    let before = github.calls().len();
    let blocked = searcher
        .search_issues(&IssueFilter::default(), Page::first(100))
        .await
        .unwrap();
    assert_eq!(blocked, Gated::LimitReached);
    assert_eq!(github.calls().len(), before);
    assert_eq!(searcher.quota().count(), 5);
}

#[tokio::test]
async fn signing_in_unblocks_without_resetting() {
    let github = Arc::new(CannedGitHub::default());
    let session = SessionFlag::new(false);
    let mut searcher = searcher(&github, &session, false);

    for _ in 0..5 {
        searcher.popular_repositories(Some("Rust"), Page::first(30)).await.unwrap();
    }
    session.sign_in();

    let outcome = searcher
        .search_issues(&IssueFilter::default(), Page::first(100))
        .await
        .unwrap();
    let issues = outcome.completed().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].language, "Rust");
    assert_eq!(issues[0].repo, "acme/scout");
    assert_eq!(searcher.quota().count(), 6);

    searcher.quota_mut().reset().unwrap();
    assert_eq!(searcher.quota().count(), 0);
}

#[tokio::test]
async fn relay_outage_falls_back_to_direct() {
    let github = Arc::new(CannedGitHub::default());
    github.take_down("http://localhost:3000");
    let session = SessionFlag::new(true);
    let mut searcher = searcher(&github, &session, true);

    let filter = IssueFilter {
        labels: vec!["documentation".to_string()],
        ..IssueFilter::default()
    };
    let issues = searcher
        .search_issues(&filter, Page::first(100))
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(issues[0].language, "Rust");
    assert_eq!(issues[0].labels, vec!["documentation"]);

    let calls = github.calls();
    assert!(calls[0].starts_with("http://localhost:3000/api/github/search/issues?"));
    assert!(calls[1].starts_with("https://api.github.com/search/issues?"));
}

#[tokio::test]
async fn readme_lookups_do_not_count() {
    let github = Arc::new(CannedGitHub::default());
    let session = SessionFlag::new(false);
    let searcher = searcher(&github, &session, false);

    assert!(searcher.readme("acme/scout").await.is_none());
    assert_eq!(searcher.quota().count(), 0);
}
