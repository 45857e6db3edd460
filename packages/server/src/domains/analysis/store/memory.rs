//! In-memory job store for tests and single-process runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobStore, StoreError, StoreResult};
use crate::domains::analysis::models::{AnalysisJob, AnalysisResult, JobFailure, JobStatus};

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, AnalysisJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &AnalysisJob) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.job_id) {
            return Err(StoreError::Duplicate(job.job_id));
        }
        jobs.insert(job.job_id, job.clone());
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> StoreResult<Option<AnalysisJob>> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<AnalysisJob>> {
        let mut jobs: Vec<AnalysisJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.user_id == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn delete_for_owner(&self, job_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get(&job_id) {
            Some(job) if job.user_id == user_id => {
                jobs.remove(&job_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim(&self, job_id: Uuid) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::InProgress;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::InProgress => {
                Ok(job.complete(result.clone(), finished_at).is_ok())
            }
            _ => Ok(false),
        }
    }

    async fn fail(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        failure: &JobFailure,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        if expected.is_terminal() {
            return Ok(false);
        }

        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) if job.status == expected => {
                job.status = JobStatus::Failed;
                job.finished_at = Some(finished_at);
                job.error_message = Some(failure.message.clone());
                job.error_details = Some(failure.details.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_retry(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        expected_retry_count: i32,
        note: &str,
    ) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) if job.status == expected && job.retry_count == expected_retry_count => {
                job.retry_count += 1;
                job.append_note(note);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<AnalysisJob>> {
        let mut stale: Vec<AnalysisJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| !job.status.is_terminal() && job.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|job| job.created_at);
        Ok(stale)
    }

    async fn delete_failed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.status == JobStatus::Failed && job.finished_at.is_some_and(|at| at < cutoff))
        });
        Ok((before - jobs.len()) as u64)
    }
}
