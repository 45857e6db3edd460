//! Output of a site crawl.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// URLs discovered on one site.
///
/// `urls` and `external_domains` are sorted and deduplicated. `link_map`
/// holds one entry per crawled page with its outbound links in document
/// order, internal and external alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub urls: Vec<String>,
    pub link_map: BTreeMap<String, Vec<String>>,
    pub external_domains: Vec<String>,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
