// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use site_analysis::testing::{MockFetcher, MockSemanticExtractor};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{BaseJobDispatcher, BaseSynthesisService, ServerDeps};
use crate::config::AnalysisSettings;
use crate::domains::analysis::models::SynthesisInput;
use crate::domains::analysis::store::JobStore;

// =============================================================================
// Mock Synthesis Service
// =============================================================================

pub struct MockSynthesis {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<SynthesisInput>>>,
}

impl MockSynthesis {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a raw reply to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    /// Queue a transport failure
    pub fn with_failure(self, error: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Err(error.into()));
        self
    }

    /// Get every input the service was called with
    pub fn calls(&self) -> Vec<SynthesisInput> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// A well-formed analysis reply, wrapped in prose like a real model answer
    pub fn valid_reply() -> String {
        let body = json!({
            "opportunity_analysis": {
                "classification": "IDEAL_PARTNER",
                "pain_score": 7,
                "potential_score": 8,
                "summary_justification": "Strong product, unclear message.",
                "primary_weakness": {"criterion": "Clarity", "evidence_quote": "We do it all"}
            },
            "exclusion_analysis": [
                {"criterion": "Generic Agency Problem", "triggered": false, "justification": "Specialised"}
            ],
            "detailed_analysis": [
                {"criterion": "Clarity", "score": 3, "reasoning": "Vague hero", "evidence_quote": "We do it all"}
            ],
            "actionable_recommendations": ["Name the customer problem in the hero section"],
            "full_text_analysis": "The site undersells a strong product."
        });
        format!("Here is the analysis:\n{body}\n")
    }
}

impl Default for MockSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSynthesisService for MockSynthesis {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<String> {
        // Record the call
        self.calls.lock().unwrap().push(input.clone());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(Self::valid_reply());
        }
        responses.remove(0).map_err(|e| anyhow!(e))
    }
}

// =============================================================================
// Recording Dispatcher
// =============================================================================

/// Records dispatched job ids instead of running them.
#[derive(Default)]
pub struct RecordingDispatcher {
    dispatched: Mutex<Vec<Uuid>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose queue is unavailable
    pub fn failing() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn dispatched(&self) -> Vec<Uuid> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self, job_id: Uuid) -> usize {
        self.dispatched
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == job_id)
            .count()
    }
}

#[async_trait]
impl BaseJobDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job_id: Uuid) -> Result<()> {
        if self.fail {
            return Err(anyhow!("queue unavailable"));
        }
        self.dispatched.lock().unwrap().push(job_id);
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub fetcher: MockFetcher,
    pub semantic_extractor: Arc<MockSemanticExtractor>,
    pub synthesis: Arc<MockSynthesis>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub settings: AnalysisSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            fetcher: MockFetcher::new(),
            semantic_extractor: Arc::new(MockSemanticExtractor::new()),
            synthesis: Arc::new(MockSynthesis::new()),
            dispatcher: Arc::new(RecordingDispatcher::new()),
            settings: AnalysisSettings::default(),
        }
    }

    /// Set a mock fetcher
    pub fn mock_fetcher(mut self, fetcher: MockFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Set a mock semantic extractor
    pub fn mock_semantic(mut self, extractor: MockSemanticExtractor) -> Self {
        self.semantic_extractor = Arc::new(extractor);
        self
    }

    /// Set a mock synthesis service
    pub fn mock_synthesis(mut self, synthesis: MockSynthesis) -> Self {
        self.synthesis = Arc::new(synthesis);
        self
    }

    /// Set a dispatcher
    pub fn mock_dispatcher(mut self, dispatcher: RecordingDispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Override the analysis settings
    pub fn settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Convert into ServerDeps over the given store
    pub fn into_deps(self, store: Arc<dyn JobStore>) -> ServerDeps {
        ServerDeps::new(
            store,
            Arc::new(self.fetcher),
            self.semantic_extractor,
            self.synthesis,
            self.dispatcher,
            Arc::new(self.settings),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
