//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by the
//! analysis activities. All external services use trait abstractions so
//! tests can swap in mocks.

use std::sync::Arc;

use site_analysis::{PageFetcher, SemanticExtractor};

use crate::config::AnalysisSettings;
use crate::domains::analysis::store::JobStore;
use crate::kernel::{BaseJobDispatcher, BaseSynthesisService};

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn JobStore>,
    /// Fetcher used for robots.txt, crawling and page processing
    pub fetcher: Arc<dyn PageFetcher>,
    pub semantic_extractor: Arc<dyn SemanticExtractor>,
    pub synthesis: Arc<dyn BaseSynthesisService>,
    pub dispatcher: Arc<dyn BaseJobDispatcher>,
    pub settings: Arc<AnalysisSettings>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn PageFetcher>,
        semantic_extractor: Arc<dyn SemanticExtractor>,
        synthesis: Arc<dyn BaseSynthesisService>,
        dispatcher: Arc<dyn BaseJobDispatcher>,
        settings: Arc<AnalysisSettings>,
    ) -> Self {
        Self {
            store,
            fetcher,
            semantic_extractor,
            synthesis,
            dispatcher,
            settings,
        }
    }
}
