//! Test harness for integration testing.
//!
//! Each test gets a fresh in-memory SQLite job store with migrations applied,
//! so tests never share state.

use anyhow::{Context, Result};
use server_core::domains::analysis::models::AnalysisJob;
use server_core::domains::analysis::store::{JobStore, SqliteJobStore};
use server_core::kernel::{ServerDeps, TestDependencies};
use std::sync::Arc;
use test_context::AsyncTestContext;
use uuid::Uuid;

/// Per-test job store plus helpers for building `ServerDeps` over it.
///
/// Use with `#[test_context(TestHarness)]` on a `#[tokio::test]`; the test
/// receives `ctx: &TestHarness`.
pub struct TestHarness {
    /// Job store - use this for fixtures and assertions.
    pub store: Arc<SqliteJobStore>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        // RUST_LOG=server_core=debug shows the job logs
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = SqliteJobStore::in_memory()
            .await
            .context("Failed to create in-memory job store")?;

        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Build server dependencies over this harness's store.
    pub fn deps(&self, test_deps: TestDependencies) -> ServerDeps {
        test_deps.into_deps(self.store.clone())
    }

    /// Load a job that must exist.
    pub async fn job(&self, job_id: Uuid) -> AnalysisJob {
        self.store
            .get(job_id)
            .await
            .expect("Failed to load job")
            .expect("Job not found")
    }
}
