//! Typed errors for the site analysis library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Page-scoped failures
//! ([`FetchError`], [`ExtractError`]) are values the caller records and moves
//! past; [`CrawlError`] is the only crawl-level failure.

use thiserror::Error;

/// Errors that can occur while fetching a single page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS or protocol failure
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request exceeded the configured timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Response body could not be read
    #[error("failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    /// Classify a reqwest error for the given URL.
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source: Box::new(error),
            }
        }
    }
}

/// Errors that can occur while turning markup into a page record.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The markup could not be walked
    #[error("parsing error: {0}")]
    Parse(String),

    /// The semantic extractor returned no usable JSON
    #[error("no JSON object in extractor reply")]
    MissingJson,

    /// The semantic extractor returned JSON of the wrong shape
    #[error("invalid page record JSON: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    /// The semantic extraction backend failed
    #[error("semantic extractor unavailable: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that abort a crawl as a whole.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Start URL is not an absolute http(s) URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Traversal finished without visiting a single URL
    #[error("no URLs visited starting from {url}")]
    NothingVisited { url: String },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
