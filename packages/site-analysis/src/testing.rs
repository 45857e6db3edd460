//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the library without
//! making real network or model calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{ExtractError, ExtractResult, FetchError, FetchResult};
use crate::traits::{
    extractor::SemanticExtractor,
    fetcher::{FetchedPage, PageFetcher},
};
use crate::types::page::{ExtractionMethod, PageRecord};

#[derive(Debug, Clone)]
enum MockResponse {
    Page(FetchedPage),
    Status(u16),
    Timeout,
}

/// A mock fetcher serving predefined pages.
///
/// Unknown URLs answer 404. Clones share state, so a clone kept by the test
/// sees the fetches made through the one handed to the code under test.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(self, url: String, response: MockResponse) -> Self {
        self.responses
            .write()
            .expect("mock lock poisoned")
            .insert(url, response);
        self
    }

    /// Serve `body` as HTML at `url`.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let page = FetchedPage::html(url.clone(), body);
        self.insert(url, MockResponse::Page(page))
    }

    /// Serve a fully specified response at its URL.
    pub fn with_response(self, page: FetchedPage) -> Self {
        let url = page.url.clone();
        self.insert(url, MockResponse::Page(page))
    }

    /// Answer `url` with a non-success status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.insert(url.into(), MockResponse::Status(status))
    }

    /// Make `url` time out.
    pub fn with_timeout(self, url: impl Into<String>) -> Self {
        self.insert(url.into(), MockResponse::Timeout)
    }

    /// Serve a robots.txt body for the site at `origin` (`https://host`).
    pub fn with_robots(self, origin: &str, body: &str) -> Self {
        let url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        let page = FetchedPage::html(url.clone(), body).with_content_type("text/plain");
        self.insert(url, MockResponse::Page(page))
    }

    /// How often `url` was fetched.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.calls
            .read()
            .expect("mock lock poisoned")
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    /// Fetches made, robots.txt excluded.
    pub fn total_fetches(&self) -> usize {
        self.calls
            .read()
            .expect("mock lock poisoned")
            .iter()
            .filter(|u| !u.ends_with("/robots.txt"))
            .count()
    }

    /// All fetched URLs in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls
            .write()
            .expect("mock lock poisoned")
            .push(url.to_string());

        let response = self
            .responses
            .read()
            .expect("mock lock poisoned")
            .get(url)
            .cloned();

        match response {
            Some(MockResponse::Page(page)) => Ok(page),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(MockResponse::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A mock semantic extractor.
///
/// Returns a predefined record per URL, or a minimal record titled
/// "Semantic: {url}" when none is configured.
#[derive(Clone, Default)]
pub struct MockSemanticExtractor {
    records: Arc<RwLock<HashMap<String, PageRecord>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockSemanticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `record` for `url`.
    pub fn with_record(self, url: impl Into<String>, record: PageRecord) -> Self {
        self.records
            .write()
            .expect("mock lock poisoned")
            .insert(url.into(), record);
        self
    }

    /// Fail extraction of `url` with a backend error.
    pub fn with_failure(self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures
            .write()
            .expect("mock lock poisoned")
            .insert(url.into(), reason.into());
        self
    }

    /// URLs passed to the extractor in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SemanticExtractor for MockSemanticExtractor {
    async fn extract(&self, _html: &str, url: &str) -> ExtractResult<PageRecord> {
        self.calls
            .write()
            .expect("mock lock poisoned")
            .push(url.to_string());

        if let Some(reason) = self
            .failures
            .read()
            .expect("mock lock poisoned")
            .get(url)
        {
            return Err(ExtractError::Backend(reason.clone().into()));
        }

        let mut record = self
            .records
            .read()
            .expect("mock lock poisoned")
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                let mut record = PageRecord::default();
                record.page_title = format!("Semantic: {url}");
                record
            });
        record.url = url.to_string();
        record.parsing_method = ExtractionMethod::Semantic;
        Ok(record)
    }
}
