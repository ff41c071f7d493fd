//! Search query construction.
//!
//! Builds strings in GitHub's search grammar: `key:value` qualifiers joined by
//! single spaces. The builders never fail; absent inputs are simply left out.

use chrono::{Duration, Months, NaiveDate, Utc};

/// Qualifiers every issue search starts with.
const OPEN_ISSUES: &str = "is:issue is:open";

/// Build an issue search query.
///
/// Token order is fixed: state qualifiers, `org:`, `language:`, one quoted
/// `label:` per label, then the trimmed free text. The free text is passed
/// through untouched so advanced qualifiers typed by the user keep working.
///
/// ```
/// use repo_scout::query::build_issue_query;
///
/// let q = build_issue_query(None, Some("Go"), &["good first issue"], Some("parser"));
/// assert_eq!(q, r#"is:issue is:open language:Go label:"good first issue" parser"#);
/// ```
pub fn build_issue_query<S: AsRef<str>>(
    organization: Option<&str>,
    language: Option<&str>,
    labels: &[S],
    free_text: Option<&str>,
) -> String {
    let mut query = String::from(OPEN_ISSUES);

    if let Some(org) = organization.filter(|o| !o.is_empty()) {
        query.push_str(&format!(" org:{}", org));
    }

    if let Some(lang) = language.filter(|l| !l.is_empty()) {
        query.push_str(&format!(" language:{}", lang));
    }

    for label in labels {
        query.push_str(&format!(" label:\"{}\"", label.as_ref()));
    }

    if let Some(text) = free_text.map(str::trim).filter(|t| !t.is_empty()) {
        query.push(' ');
        query.push_str(text);
    }

    query
}

/// The repository discovery modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryKind {
    /// Highest starred repositories
    Top,
    /// Repositories pushed to in the last 30 days
    Popular,
    /// Repositories created in the last 6 months that already gained traction
    Growing,
    /// Caller supplied query text
    Custom(String),
}

/// Build a repository search query relative to the current UTC date.
pub fn build_repository_query(kind: &RepositoryKind, language: Option<&str>) -> String {
    build_repository_query_on(kind, language, Utc::now().date_naive())
}

/// Build a repository search query with date qualifiers computed from `today`.
pub fn build_repository_query_on(
    kind: &RepositoryKind,
    language: Option<&str>,
    today: NaiveDate,
) -> String {
    let mut query = match kind {
        RepositoryKind::Top => "stars:>1000".to_string(),
        RepositoryKind::Popular => {
            let since = today - Duration::days(30);
            format!("pushed:>{} stars:>100", since.format("%Y-%m-%d"))
        }
        RepositoryKind::Growing => {
            // chrono clamps to the last day of a shorter month
            let since = today.checked_sub_months(Months::new(6)).unwrap_or(today);
            format!("created:>{} stars:>50", since.format("%Y-%m-%d"))
        }
        RepositoryKind::Custom(text) => text.clone(),
    };

    if let Some(lang) = language.filter(|l| !l.is_empty()) {
        query.push_str(&format!(" language:{}", lang));
    }

    query
}
