//! Error types for search and storage operations.
//!
//! Only failures that leave the caller without any usable result set are
//! represented here. Enrichment misses (language, templates, README) are
//! absorbed where they happen and never become a `ScoutError`.

use std::error::Error;

use thiserror::Error;

/// A request that never produced an HTTP response (DNS, connect, TLS, timeout).
#[derive(Error, Debug)]
#[error("request to {url} failed: {source}")]
pub struct TransportError {
    /// The URL of the attempt that failed
    pub url: String,
    /// Underlying client error
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

impl TransportError {
    pub fn new(url: impl Into<String>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Errors surfaced by the search services and the quota store
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Every routed attempt failed before a response arrived
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The primary search request came back with a non-success status
    #[error("{api} error: {status} {status_text}")]
    Api {
        /// Name of the upstream API
        api: &'static str,
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// The primary response body did not match the expected envelope
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The router was asked to execute an empty attempt list
    #[error("no route configured for request")]
    NoRoute,

    /// Reading or writing local storage failed
    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, ScoutError>;
