//! HTTP transport and relay/direct routing.
//!
//! [`TransportRouter`] turns an upstream path such as `search/issues?q=...`
//! into an ordered list of [`Attempt`]s (preferred first, fallback second) and
//! executes them. A response that arrives is returned as-is unless it is a
//! non-success status and another attempt remains; callers inspect the status.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, ScoutError, TransportError};
use crate::models::SearchResults;

const ACCEPT: &str = "application/vnd.github.v3+json";
const API_VERSION: &str = "2022-11-28";

/// Rate limit counters reported on every GitHub response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: u32,
    pub limit: u32,
    /// Unix timestamp at which the window resets
    pub reset: Option<u64>,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let parse = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<u64>().ok();

        let remaining = parse("X-RateLimit-Remaining")?;
        let limit = parse("X-RateLimit-Limit")?;
        Some(RateLimit {
            remaining: u32::try_from(remaining).ok()?,
            limit: u32::try_from(limit).ok()?,
            reset: parse("X-RateLimit-Reset"),
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds until the window resets, measured from `now` (unix seconds).
    pub fn reset_in(&self, now: u64) -> Option<u64> {
        self.reset.map(|reset| reset.saturating_sub(now))
    }
}

/// One concrete request the router may issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// A received HTTP response, whatever its status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
    pub rate_limit: Option<RateLimit>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            rate_limit: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// The network seam. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, attempt: &Attempt) -> std::result::Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    fn log_rate_limit(url: &str, rate_limit: &RateLimit) {
        debug!(
            "Rate limit for {}: {}/{}",
            url, rate_limit.remaining, rate_limit.limit
        );
        if rate_limit.is_exhausted() {
            let now = Utc::now().timestamp().max(0) as u64;
            match rate_limit.reset_in(now) {
                Some(secs) => warn!("Rate limit reached. Resets in {} seconds", secs + 1),
                None => warn!("Rate limit reached"),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, attempt: &Attempt) -> std::result::Result<HttpResponse, TransportError> {
        debug!("Requesting URL: {}", attempt.url);

        let mut request = self.client.get(&attempt.url);
        for (name, value) in &attempt.headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(&attempt.url, e))?;

        let status = response.status();
        let rate_limit = RateLimit::from_headers(response.headers());
        if let Some(rate_limit) = &rate_limit {
            Self::log_rate_limit(&attempt.url, rate_limit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(&attempt.url, e))?;

        Ok(HttpResponse {
            status,
            body,
            rate_limit,
        })
    }
}

/// Chooses between the same-origin relay and the upstream API
#[derive(Clone)]
pub struct TransportRouter {
    transport: Arc<dyn Transport>,
    api_base: String,
    proxy_base: Option<String>,
    prefer_proxy: bool,
    token: Option<String>,
}

impl TransportRouter {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            proxy_base: config
                .proxy_base
                .as_deref()
                .map(|base| base.trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
            prefer_proxy: config.use_proxy,
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        }
    }

    /// Direct upstream request. Carries the bearer token when one is configured.
    fn direct(&self, path: &str) -> Attempt {
        let mut headers = vec![
            ("Accept".to_string(), ACCEPT.to_string()),
            ("X-GitHub-Api-Version".to_string(), API_VERSION.to_string()),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        Attempt {
            url: format!("{}/{}", self.api_base, path),
            headers,
        }
    }

    /// Relay request. The relay injects its own credential.
    fn relayed(&self, proxy_base: &str, path: &str) -> Attempt {
        Attempt {
            url: format!("{}/{}", proxy_base, path),
            headers: vec![("Accept".to_string(), ACCEPT.to_string())],
        }
    }

    /// Ordered attempts for an upstream path: preferred first, fallback second.
    pub fn attempts(&self, path: &str) -> Vec<Attempt> {
        let path = path.trim_start_matches('/');
        let direct = self.direct(path);
        match &self.proxy_base {
            None => vec![direct],
            Some(proxy) if self.prefer_proxy => vec![self.relayed(proxy, path), direct],
            Some(proxy) => vec![direct, self.relayed(proxy, path)],
        }
    }

    /// GET an upstream path through the configured routes.
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        self.execute(&self.attempts(path)).await
    }

    /// Execute attempts in order until one yields a usable response.
    ///
    /// A non-success status on the last attempt is returned, not raised. A
    /// network failure on the last attempt propagates.
    pub async fn execute(&self, attempts: &[Attempt]) -> Result<HttpResponse> {
        let mut last_error = None;

        for (idx, attempt) in attempts.iter().enumerate() {
            let is_last = idx + 1 == attempts.len();
            match self.transport.get(attempt).await {
                Ok(response) if response.is_success() || is_last => return Ok(response),
                Ok(response) => {
                    debug!(
                        "{} returned {}, trying fallback route",
                        attempt.url, response.status
                    );
                }
                Err(e) if is_last => last_error = Some(e),
                Err(e) => debug!("{}, trying fallback route", e),
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err(ScoutError::NoRoute),
        }
    }
}

/// Page selection for search endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub per_page: u32,
    pub page: u32,
}

impl Page {
    pub fn new(per_page: u32, page: u32) -> Self {
        Self { per_page, page }
    }

    /// The first page at the given size.
    pub fn first(per_page: u32) -> Self {
        Self::new(per_page, 1)
    }
}

/// Upstream path for one page of a `/search/{endpoint}` query, newest or
/// biggest first.
pub(crate) fn search_path(endpoint: &str, query: &str, sort: &str, page: Page) -> String {
    let q: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!(
        "search/{}?q={}&sort={}&order=desc&per_page={}&page={}",
        endpoint, q, sort, page.per_page, page.page
    )
}

/// Fetch and decode one page of search results.
///
/// Unlike the router, a non-success status here is fatal.
pub(crate) async fn search_page<T: DeserializeOwned>(
    router: &TransportRouter,
    endpoint: &str,
    query: &str,
    sort: &str,
    page: Page,
) -> Result<SearchResults<T>> {
    let response = router.get(&search_path(endpoint, query, sort, page)).await?;

    if !response.is_success() {
        return Err(ScoutError::Api {
            api: "GitHub API",
            status: response.status.as_u16(),
            status_text: response.status_text().to_string(),
        });
    }

    Ok(response.json()?)
}
