//! Stale job reaper and failed-job retention.
//!
//! A job is stale when it is still `pending` or `in_progress` after the
//! staleness window. The first time, it gets one retry (re-dispatch); the
//! second time, it is failed. Every write is conditioned on the status and
//! retry count observed during the sweep, so a job that finishes in the
//! meantime is left alone.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domains::analysis::models::{AnalysisJob, JobFailure};
use crate::domains::analysis::store::StoreError;
use crate::kernel::ServerDeps;

/// What one maintenance run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub retried: usize,
    pub failed: usize,
    /// Stale jobs whose state changed before the conditional write
    pub skipped: usize,
    pub purged: u64,
}

/// Both sweeps, as of now.
pub async fn run_maintenance(deps: &ServerDeps) -> Result<ReapReport, StoreError> {
    let now = Utc::now();
    let mut report = reap_stale_jobs(now, deps).await?;
    report.purged = purge_expired_failures(now, deps).await?;

    if report != ReapReport::default() {
        info!(
            retried = report.retried,
            failed = report.failed,
            skipped = report.skipped,
            purged = report.purged,
            "Job maintenance finished"
        );
    }
    Ok(report)
}

/// Retry or fail jobs stuck in a non-terminal state.
pub async fn reap_stale_jobs(
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<ReapReport, StoreError> {
    let cutoff = now - deps.settings.staleness_window;
    let stale = deps.store.find_stale(cutoff).await?;

    let mut report = ReapReport::default();
    for job in stale {
        if job.retry_count == 0 {
            retry(&job, now, deps, &mut report).await?;
        } else {
            give_up(&job, now, deps, &mut report).await?;
        }
    }
    Ok(report)
}

async fn retry(
    job: &AnalysisJob,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    report: &mut ReapReport,
) -> Result<(), StoreError> {
    let note = format!(
        "{}: stale in '{}', retry {} dispatched",
        now.to_rfc3339(),
        job.status,
        job.retry_count + 1
    );

    if !deps
        .store
        .record_retry(job.job_id, job.status, job.retry_count, &note)
        .await?
    {
        report.skipped += 1;
        return Ok(());
    }

    info!(job_id = %job.job_id, status = %job.status, "Retrying stale job");
    report.retried += 1;

    if let Err(e) = deps.dispatcher.dispatch(job.job_id).await {
        // The next sweep fails the job
        warn!(job_id = %job.job_id, error = %e, "Retry dispatch failed");
    }
    Ok(())
}

async fn give_up(
    job: &AnalysisJob,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    report: &mut ReapReport,
) -> Result<(), StoreError> {
    let message = format!(
        "Job stalled in '{}' and did not finish after being retried",
        job.status
    );
    let failure = JobFailure {
        message: message.clone(),
        details: json!({
            "kind": "stale",
            "message": message,
            "context": {
                "stalled_status": job.status.as_str(),
                "retry_count": job.retry_count,
                "created_at": job.created_at.to_rfc3339(),
            },
        }),
    };

    if deps.store.fail(job.job_id, job.status, &failure, now).await? {
        warn!(job_id = %job.job_id, status = %job.status, "Stale job failed");
        report.failed += 1;
    } else {
        report.skipped += 1;
    }
    Ok(())
}

/// Delete failed jobs older than the retention window.
pub async fn purge_expired_failures(
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<u64, StoreError> {
    let cutoff = now - deps.settings.retention_window;
    let purged = deps.store.delete_failed_before(cutoff).await?;
    if purged > 0 {
        info!(purged, "Expired failed jobs deleted");
    }
    Ok(purged)
}
