//! Owner-facing job operations: submit, read, list, delete.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::analysis::models::AnalysisJob;
use crate::domains::analysis::store::StoreError;
use crate::kernel::ServerDeps;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Submit a site for analysis.
///
/// Inserts a `pending` job and dispatches it. If dispatch fails the job stays
/// `pending` and the reaper picks it up once it goes stale.
pub async fn submit_analysis(
    url: &str,
    user_id: &str,
    job_id: Option<Uuid>,
    deps: &ServerDeps,
) -> Result<AnalysisJob, SubmitError> {
    let normalized = site_analysis::crawlers::url::normalize(url.trim())
        .ok_or_else(|| SubmitError::InvalidUrl(url.to_string()))?;

    let job = AnalysisJob::builder()
        .job_id(job_id.unwrap_or_else(Uuid::new_v4))
        .user_id(user_id)
        .url(normalized)
        .build();

    deps.store.insert(&job).await?;
    info!(job_id = %job.job_id, user_id = %user_id, url = %job.url, "Analysis job submitted");

    if let Err(e) = deps.dispatcher.dispatch(job.job_id).await {
        warn!(
            job_id = %job.job_id,
            error = %e,
            "Dispatch failed, leaving job to the reaper"
        );
    }

    Ok(job)
}

pub async fn get_job(job_id: Uuid, deps: &ServerDeps) -> Result<Option<AnalysisJob>, StoreError> {
    deps.store.get(job_id).await
}

/// Jobs of one user, newest first.
pub async fn list_jobs_for_user(
    user_id: &str,
    deps: &ServerDeps,
) -> Result<Vec<AnalysisJob>, StoreError> {
    deps.store.list_for_user(user_id).await
}

/// Delete a job if `user_id` owns it. Returns whether a job was deleted.
pub async fn delete_job_for_owner(
    job_id: Uuid,
    user_id: &str,
    deps: &ServerDeps,
) -> Result<bool, StoreError> {
    let deleted = deps.store.delete_for_owner(job_id, user_id).await?;
    if deleted {
        info!(job_id = %job_id, user_id = %user_id, "Analysis job deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::analysis::models::JobStatus;
    use crate::domains::analysis::store::MemoryJobStore;
    use crate::kernel::test_dependencies::RecordingDispatcher;
    use crate::kernel::TestDependencies;
    use std::sync::Arc;

    #[tokio::test]
    async fn submit_inserts_pending_job_and_dispatches_it() {
        let test_deps = TestDependencies::new();
        let dispatcher = test_deps.dispatcher.clone();
        let deps = test_deps.into_deps(Arc::new(MemoryJobStore::new()));

        let job = submit_analysis("https://Example.com/about/?ref=x", "alice", None, &deps)
            .await
            .unwrap();

        assert_eq!(job.url, "https://example.com/about");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(dispatcher.dispatched(), vec![job.job_id]);
        assert!(get_job(job.job_id, &deps).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn submit_honours_a_caller_supplied_id() {
        let deps = TestDependencies::new().into_deps(Arc::new(MemoryJobStore::new()));
        let id = Uuid::new_v4();

        let job = submit_analysis("https://example.com", "alice", Some(id), &deps)
            .await
            .unwrap();

        assert_eq!(job.job_id, id);
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_the_job() {
        let deps = TestDependencies::new()
            .mock_dispatcher(RecordingDispatcher::failing())
            .into_deps(Arc::new(MemoryJobStore::new()));

        let job = submit_analysis("https://example.com", "alice", None, &deps)
            .await
            .unwrap();

        let stored = get_job(job.job_id, &deps).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_insert() {
        let store = Arc::new(MemoryJobStore::new());
        let deps = TestDependencies::new().into_deps(store.clone());

        let err = submit_analysis("not a url", "alice", None, &deps)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::InvalidUrl(_)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let deps = TestDependencies::new().into_deps(Arc::new(MemoryJobStore::new()));
        let job = submit_analysis("https://example.com", "alice", None, &deps)
            .await
            .unwrap();

        assert!(!delete_job_for_owner(job.job_id, "mallory", &deps).await.unwrap());
        assert_eq!(list_jobs_for_user("alice", &deps).await.unwrap().len(), 1);
        assert!(delete_job_for_owner(job.job_id, "alice", &deps).await.unwrap());
        assert!(list_jobs_for_user("alice", &deps).await.unwrap().is_empty());
    }
}
