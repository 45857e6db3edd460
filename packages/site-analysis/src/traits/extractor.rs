//! Semantic (model-backed) page extraction.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::page::PageRecord;

/// Produces a [`PageRecord`] from markup the structural extractor cannot
/// handle reliably.
///
/// Implementations tag the returned record as
/// [`crate::ExtractionMethod::Semantic`] and set its `url`.
#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    async fn extract(&self, html: &str, url: &str) -> ExtractResult<PageRecord>;
}

#[async_trait]
impl<T: SemanticExtractor + ?Sized> SemanticExtractor for std::sync::Arc<T> {
    async fn extract(&self, html: &str, url: &str) -> ExtractResult<PageRecord> {
        (**self).extract(html, url).await
    }
}
