//! Persistence for analysis jobs.
//!
//! Every mutation is conditional on the status (and, for retries, the retry
//! count) the caller last observed. A write whose condition no longer holds
//! changes nothing and returns `false`.

mod memory;
mod sqlite;

pub use memory::MemoryJobStore;
pub use sqlite::SqliteJobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{AnalysisJob, AnalysisResult, JobFailure, JobStatus};

/// Storage errors. These propagate; the reaper resolves jobs they strand.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to serialize job field: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt job record {job_id}: {reason}")]
    Corrupt { job_id: String, reason: String },

    #[error("job already exists: {0}")]
    Duplicate(Uuid),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &AnalysisJob) -> StoreResult<()>;

    async fn get(&self, job_id: Uuid) -> StoreResult<Option<AnalysisJob>>;

    /// Jobs owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<AnalysisJob>>;

    /// Delete a job if `user_id` owns it.
    async fn delete_for_owner(&self, job_id: Uuid, user_id: &str) -> StoreResult<bool>;

    /// pending → in_progress.
    async fn claim(&self, job_id: Uuid) -> StoreResult<bool>;

    /// in_progress → completed, storing the result.
    async fn complete(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// `expected` → failed, storing the failure.
    async fn fail(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        failure: &JobFailure,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Bump `retry_count` and append a note, status unchanged.
    async fn record_retry(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        expected_retry_count: i32,
        note: &str,
    ) -> StoreResult<bool>;

    /// Non-terminal jobs created before `cutoff`.
    async fn find_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<AnalysisJob>>;

    /// Delete failed jobs that finished before `cutoff`.
    async fn delete_failed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
