//! Page fetching abstraction.

use async_trait::async_trait;

use crate::error::FetchResult;

/// A successfully fetched response.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub status: u16,

    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,

    pub body: String,
}

impl FetchedPage {
    /// Build an HTML page as a server at `url` would return it.
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// True when the response declares `text/html`.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Fetches a single URL.
///
/// Implementations send the crawler's user agent, apply a request timeout
/// and report any non-success status as [`crate::FetchError::Status`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        (**self).fetch(url).await
    }
}
