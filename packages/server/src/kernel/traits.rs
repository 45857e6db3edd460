// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The orchestrator and reaper are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSynthesisService)

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domains::analysis::models::SynthesisInput;

// =============================================================================
// Synthesis Service Trait (Infrastructure - LLM analysis of a whole site)
// =============================================================================

#[async_trait]
pub trait BaseSynthesisService: Send + Sync {
    /// Analyse the aggregated site data (returns the raw model reply)
    ///
    /// The reply is expected to contain one JSON object, possibly wrapped in
    /// prose. Parsing is left to the caller.
    async fn synthesize(&self, input: &SynthesisInput) -> Result<String>;
}

// =============================================================================
// Job Dispatcher Trait (Infrastructure - work queue)
// =============================================================================

#[async_trait]
pub trait BaseJobDispatcher: Send + Sync {
    /// Hand a job id to the worker pool. At-least-once; workers tolerate
    /// duplicates through the conditional claim.
    async fn dispatch(&self, job_id: Uuid) -> Result<()>;
}
