//! Raw GitHub payloads and the normalized records handed to callers.
//!
//! Raw types mirror the REST API fields we read; everything else in the
//! payload is ignored by serde. Processed types are built once and never
//! mutated afterwards.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Placeholder used whenever a repository language cannot be resolved.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Placeholder for repositories without a description.
pub const NO_DESCRIPTION: &str = "No description available";

/// Paginated envelope returned by the search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults<T> {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub login: String,
}

/// An issue as returned by `/search/issues`
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub id: u64,
    pub title: String,
    pub html_url: String,
    /// API URL of the owning repository, e.g. `https://api.github.com/repos/owner/name`
    pub repository_url: String,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    pub user: RawUser,
    pub created_at: String,
    #[serde(default)]
    pub comments: u64,
    pub state: IssueState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOwner {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

/// A repository as returned by `/search/repositories` and `/repos/{full_name}`
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub language: Option<String>,
    pub updated_at: String,
    pub created_at: String,
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub owner: RawOwner,
    pub open_issues_count: u64,
}

/// The only field read from a repository detail lookup during issue enrichment.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoryLanguage {
    pub language: Option<String>,
}

/// Body of `/repos/{full_name}/contents/{path}` and `/repos/{full_name}/readme`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentPayload {
    pub content: Option<String>,
}

impl ContentPayload {
    /// Decode the base64 body. GitHub wraps the encoding at 60 columns.
    ///
    /// Empty, malformed or non UTF-8 content yields `None`.
    pub fn decode(&self) -> Option<String> {
        let encoded: String = self
            .content
            .as_deref()?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if encoded.is_empty() {
            return None;
        }
        let bytes = STANDARD.decode(encoded).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Display-ready issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedIssue {
    pub title: String,
    /// Repository full name (`owner/name`)
    pub repo: String,
    pub labels: Vec<String>,
    pub language: String,
    pub url: String,
    pub author: String,
    pub created_at: String,
    pub comments: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributing_guide: Option<String>,
}

impl ProcessedIssue {
    /// Join a raw issue with its enrichment results.
    pub fn from_raw(raw: &RawIssue, language: Option<String>, templates: RepoTemplates) -> Self {
        Self {
            title: raw.title.clone(),
            repo: repo_full_name(&raw.repository_url).to_string(),
            labels: raw.labels.iter().map(|l| l.name.clone()).collect(),
            language: resolve_language(language),
            url: raw.html_url.clone(),
            author: raw.user.login.clone(),
            created_at: raw.created_at.clone(),
            comments: raw.comments,
            pr_template: templates.pr_template,
            contributing_guide: templates.contributing_guide,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOwner {
    pub login: String,
    pub avatar_url: String,
    pub profile_url: String,
}

/// Display-ready repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub language: String,
    pub last_updated: String,
    pub topics: Vec<String>,
    pub owner: RepositoryOwner,
    pub open_issues: u64,
    pub created_at: String,
}

impl From<&RawRepository> for ProcessedRepository {
    fn from(repo: &RawRepository) -> Self {
        Self {
            id: repo.id,
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            description: repo
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            url: repo.html_url.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            language: resolve_language(repo.language.clone()),
            last_updated: repo.updated_at.clone(),
            topics: repo.topics.clone(),
            owner: RepositoryOwner {
                login: repo.owner.login.clone(),
                avatar_url: repo.owner.avatar_url.clone(),
                profile_url: repo.owner.html_url.clone(),
            },
            open_issues: repo.open_issues_count,
            created_at: repo.created_at.clone(),
        }
    }
}

/// Contribution templates found in a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoTemplates {
    pub pr_template: Option<String>,
    pub contributing_guide: Option<String>,
}

/// Resolve a possibly missing language to a displayable one.
pub fn resolve_language(language: Option<String>) -> String {
    language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// Extract `owner/name` from a repository API URL.
///
/// Anything after the `/repos/` segment is the full name; URLs without that
/// segment are returned unchanged.
pub fn repo_full_name(repository_url: &str) -> &str {
    match repository_url.find("/repos/") {
        Some(idx) => repository_url[idx + "/repos/".len()..].trim_end_matches('/'),
        None => repository_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_repo(description: Option<&str>, language: Option<&str>) -> RawRepository {
        serde_json::from_value(json!({
            "id": 42,
            "name": "scout",
            "full_name": "acme/scout",
            "description": description,
            "html_url": "https://github.com/acme/scout",
            "stargazers_count": 1200,
            "forks_count": 33,
            "language": language,
            "updated_at": "2024-05-01T10:00:00Z",
            "created_at": "2020-01-01T00:00:00Z",
            "pushed_at": "2024-05-01T09:00:00Z",
            "topics": ["cli", "github"],
            "owner": {
                "login": "acme",
                "avatar_url": "https://avatars.githubusercontent.com/u/1",
                "html_url": "https://github.com/acme"
            },
            "open_issues_count": 7,
            "watchers_count": 1200,
            "default_branch": "main"
        }))
        .unwrap()
    }

    #[test]
    fn repository_fallbacks_apply() {
        let processed = ProcessedRepository::from(&raw_repo(None, None));
        assert_eq!(processed.description, NO_DESCRIPTION);
        assert_eq!(processed.language, UNKNOWN_LANGUAGE);
        assert_eq!(processed.owner.profile_url, "https://github.com/acme");
        assert_eq!(processed.topics, vec!["cli", "github"]);
    }

    #[test]
    fn repository_mapping_is_stable() {
        let raw = raw_repo(Some("A scout"), Some("Rust"));
        let first = ProcessedRepository::from(&raw);
        let second = ProcessedRepository::from(&raw);
        assert_eq!(first, second);
        assert_eq!(first.language, "Rust");
        assert_eq!(first.stars, 1200);
        assert_eq!(first.last_updated, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn missing_topics_default_to_empty() {
        let mut value = json!({
            "id": 1, "name": "n", "full_name": "o/n", "description": null,
            "html_url": "u", "stargazers_count": 0, "forks_count": 0, "language": null,
            "updated_at": "t", "created_at": "t", "pushed_at": null,
            "owner": {"login": "o", "avatar_url": "a", "html_url": "h"},
            "open_issues_count": 0
        });
        value.as_object_mut().unwrap().remove("topics");
        let raw: RawRepository = serde_json::from_value(value).unwrap();
        assert!(ProcessedRepository::from(&raw).topics.is_empty());
    }

    #[test]
    fn full_name_from_repository_url() {
        assert_eq!(
            repo_full_name("https://api.github.com/repos/tokio-rs/tokio"),
            "tokio-rs/tokio"
        );
        assert_eq!(repo_full_name("tokio-rs/tokio"), "tokio-rs/tokio");
    }

    #[test]
    fn blank_language_resolves_to_unknown() {
        assert_eq!(resolve_language(Some(String::new())), UNKNOWN_LANGUAGE);
        assert_eq!(resolve_language(Some("Go".into())), "Go");
    }

    #[test]
    fn content_decoding_ignores_line_wraps() {
        let payload = ContentPayload {
            content: Some("IyBDb250cmli\ndXRpbmcK\n".to_string()),
        };
        assert_eq!(payload.decode().as_deref(), Some("# Contributing\n"));
    }

    #[test]
    fn malformed_or_empty_content_is_a_miss() {
        let bad = ContentPayload {
            content: Some("!!not base64!!".to_string()),
        };
        assert!(bad.decode().is_none());
        assert!(ContentPayload { content: Some(String::new()) }.decode().is_none());
        assert!(ContentPayload { content: None }.decode().is_none());
    }

    #[test]
    fn issue_joins_enrichment() {
        let raw: RawIssue = serde_json::from_value(json!({
            "id": 9,
            "title": "Add --json flag",
            "html_url": "https://github.com/acme/scout/issues/9",
            "repository_url": "https://api.github.com/repos/acme/scout",
            "labels": [{"name": "good first issue", "color": "7057ff"}],
            "user": {"login": "octocat"},
            "created_at": "2024-01-03T00:00:00Z",
            "comments": 2,
            "state": "open"
        }))
        .unwrap();
        let templates = RepoTemplates {
            pr_template: Some("## Summary".into()),
            contributing_guide: None,
        };
        let issue = ProcessedIssue::from_raw(&raw, None, templates.clone());
        assert_eq!(issue, ProcessedIssue::from_raw(&raw, None, templates));
        assert_eq!(issue.repo, "acme/scout");
        assert_eq!(issue.language, UNKNOWN_LANGUAGE);
        assert_eq!(issue.labels, vec!["good first issue"]);
        assert_eq!(issue.pr_template.as_deref(), Some("## Summary"));
        assert!(issue.contributing_guide.is_none());
    }
}
