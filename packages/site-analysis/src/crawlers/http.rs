//! reqwest-backed page fetcher.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CrawlError, FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};
use crate::types::config::CrawlConfig;

/// Fetches pages over HTTP with a fixed user agent and timeout.
///
/// # Example
///
/// ```rust,ignore
/// use site_analysis::{CrawlConfig, HttpFetcher};
///
/// let fetcher = HttpFetcher::from_config(&CrawlConfig::default())?;
/// let page = fetcher.fetch("https://example.com").await?;
/// ```
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher with the given user agent and timeout.
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Client(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    /// Create a fetcher from a crawl configuration.
    pub fn from_config(config: &CrawlConfig) -> Result<Self, CrawlError> {
        Self::new(config.user_agent.clone(), config.request_timeout)
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                FetchError::from_reqwest(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Capture final URL after redirects
        let final_url = response.url().to_string();

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
